//! Leadership tests: chairman/director derivation, incumbency stickiness,
//! and the end-of-round exclusion (veto) phase.

use rust_decimal::Decimal;

use bourse::core::money::dec;
use bourse::core::state::GameState;
use bourse::leadership::{exclusion, tracker};
use bourse::round::{scheduler, settlement};
use bourse::{
    EngineError, EventId, GameConfig, Holding, LeaderRole, MarketEvent, PlayerId, RoundPhase,
    Severity, Symbol,
};

fn setup(players: usize) -> (GameConfig, GameState) {
    let config = GameConfig::default();
    let names: Vec<String> = (0..players).map(|i| format!("Player {i}")).collect();
    let state = GameState::new(&config, &names, 42).unwrap();
    (config, state)
}

fn give_shares(state: &mut GameState, symbol: &Symbol, player: PlayerId, qty: u64) {
    let price = state.stock(symbol).unwrap().price;
    state.players[player]
        .holdings
        .entry(symbol.clone())
        .or_insert_with(Holding::default)
        .add_shares(qty, price);
    state.stocks.get_mut(symbol).unwrap().available -= qty;
}

fn inject_event(
    state: &mut GameState,
    owner: PlayerId,
    symbol: &Symbol,
    impact: Decimal,
) -> EventId {
    let id = state.alloc_event_id();
    let event = MarketEvent {
        id,
        headline: format!("scripted event {id}"),
        severity: Severity::from_impact(impact),
        affected: std::iter::once(symbol.clone()).collect(),
        impact,
        owner,
        round: state.round,
        excluded_by: None,
    };
    state.events.insert(id, event);
    state.round_events.push(id);
    id
}

/// Run every trading turn of the current round; returns the boundary
/// outcome.
fn run_round(state: &mut GameState, config: &GameConfig) -> bourse::TurnOutcome {
    let turns = state.player_count() as u32 * config.turns_per_round;
    for _ in 0..turns - 1 {
        let outcome = scheduler::end_turn(state, config).unwrap();
        assert!(!outcome.round_ended);
    }
    scheduler::end_turn(state, config).unwrap()
}

/// 60% is chairman; 30% is director only on paper. With a chairman
/// present the stock contributes no director veto entry, and the chairman
/// sees every player's events on it.
#[test]
fn test_chairman_supersedes_director_for_vetoes() {
    let (config, mut state) = setup(3);
    let a = PlayerId::new(0);
    let b = PlayerId::new(1);
    let bank = Symbol::new("BANK");
    give_shares(&mut state, &bank, a, 600);
    give_shares(&mut state, &bank, b, 300);
    tracker::recompute(&mut state, &bank, &config).unwrap();

    assert_eq!(state.stock(&bank).unwrap().chairman, Some(a));
    assert_eq!(state.stock(&bank).unwrap().director, Some(b));

    let own = inject_event(&mut state, b, &bank, dec(10));
    let other = inject_event(&mut state, PlayerId::new(2), &bank, dec(-15));

    let outcome = run_round(&mut state, &config);
    assert!(outcome.leadership_phase_required);
    assert_eq!(outcome.leaders.len(), 1);
    assert_eq!(outcome.leaders[0].player, a);

    let opportunities = exclusion::opportunities(&state).unwrap();
    assert_eq!(opportunities.len(), 1);
    let group = &opportunities[0].groups[0];
    assert_eq!(group.role, LeaderRole::Chairman);
    assert!(group.events.contains(&own));
    assert!(group.events.contains(&other));
}

/// An incumbent chairman keeps the title while still qualified, even if
/// another holder matches their stake.
#[test]
fn test_incumbent_chairman_retains_on_tie() {
    let (config, mut state) = setup(2);
    let a = PlayerId::new(1);
    let b = PlayerId::new(0);
    let tech = Symbol::new("TECH");

    give_shares(&mut state, &tech, a, 500);
    tracker::recompute(&mut state, &tech, &config).unwrap();
    assert_eq!(state.stock(&tech).unwrap().chairman, Some(a));

    // The other player matches the 50% stake; the incumbent stays.
    give_shares(&mut state, &tech, b, 500);
    tracker::recompute(&mut state, &tech, &config).unwrap();
    assert_eq!(state.stock(&tech).unwrap().chairman, Some(a));

    // The incumbent drops below threshold and loses the chair.
    state.players[a].holdings.get_mut(&tech).unwrap().remove_shares(200);
    state.stocks.get_mut(&tech).unwrap().available += 200;
    tracker::recompute(&mut state, &tech, &config).unwrap();
    assert_eq!(state.stock(&tech).unwrap().chairman, Some(b));
    // At 30% the former chairman qualifies as director
    assert_eq!(state.stock(&tech).unwrap().director, Some(a));
}

/// Directors only see their own events on stocks they lead.
#[test]
fn test_director_sees_only_own_events() {
    let (config, mut state) = setup(2);
    let d = PlayerId::new(0);
    let other = PlayerId::new(1);
    let auto = Symbol::new("AUTO");
    give_shares(&mut state, &auto, d, 300); // 30%, no chairman
    tracker::recompute(&mut state, &auto, &config).unwrap();

    let own = inject_event(&mut state, d, &auto, dec(5));
    let foreign = inject_event(&mut state, other, &auto, dec(-20));

    let outcome = run_round(&mut state, &config);
    assert!(outcome.leadership_phase_required);

    let opportunities = exclusion::opportunities(&state).unwrap();
    let group = &opportunities[0].groups[0];
    assert_eq!(group.role, LeaderRole::Director);
    assert_eq!(group.events, vec![own]);

    // And the rejection is enforced, not just hidden
    let err = exclusion::exclude_event(&mut state, foreign, d).unwrap_err();
    assert!(matches!(err, EngineError::Leadership { .. }));
}

/// A veto removes the event from settlement; one leader window at a time.
#[test]
fn test_exclusion_phase_flow() {
    let (config, mut state) = setup(2);
    let a = PlayerId::new(0);
    let b = PlayerId::new(1);
    let tech = Symbol::new("TECH");
    give_shares(&mut state, &tech, a, 600);
    tracker::recompute(&mut state, &tech, &config).unwrap();

    let bad = inject_event(&mut state, b, &tech, dec(-25));
    let good = inject_event(&mut state, a, &tech, dec(10));

    let outcome = run_round(&mut state, &config);
    assert!(outcome.leadership_phase_required);
    assert!(matches!(state.phase, RoundPhase::AwaitingExclusion(_)));

    // Only the active leader's window is open
    let err = exclusion::exclude_event(&mut state, bad, b).unwrap_err();
    assert!(matches!(err, EngineError::StateConflict { .. }));

    exclusion::exclude_event(&mut state, bad, a).unwrap();
    // A second veto of the same event is a validation error
    let err = exclusion::exclude_event(&mut state, bad, a).unwrap_err();
    assert!(matches!(err, EngineError::Validation { .. }));
    // Re-querying never re-offers the excluded event
    let opportunities = exclusion::opportunities(&state).unwrap();
    assert_eq!(opportunities[0].groups[0].events, vec![good]);

    assert!(exclusion::advance_to_next_leader(&mut state).unwrap());

    let report = settlement::process(&mut state, &config).unwrap();
    let m = &report.price_moves[0];
    assert_eq!(m.new_price, dec(110)); // only the +10 survived
    assert_eq!(m.events.len(), 1);
    assert_eq!(m.events[0].event, good);
}

/// Exclusion endpoints demand the exclusion phase.
#[test]
fn test_exclusion_requires_phase() {
    let (_, mut state) = setup(2);
    let err = exclusion::opportunities(&state).unwrap_err();
    assert!(matches!(err, EngineError::StateConflict { .. }));
    let err = exclusion::advance_to_next_leader(&mut state).unwrap_err();
    assert!(matches!(err, EngineError::StateConflict { .. }));
}

/// Leader order is chairmen before pure directors, each in seat order.
#[test]
fn test_leader_ordering() {
    let (config, mut state) = setup(4);
    give_shares(&mut state, &Symbol::new("TECH"), PlayerId::new(3), 550);
    give_shares(&mut state, &Symbol::new("BANK"), PlayerId::new(1), 500);
    give_shares(&mut state, &Symbol::new("AUTO"), PlayerId::new(0), 260);
    tracker::recompute_all(&mut state, &config).unwrap();

    let leaders = tracker::leaders(&state);
    let players: Vec<PlayerId> = leaders.iter().map(|l| l.player).collect();
    assert_eq!(
        players,
        vec![PlayerId::new(1), PlayerId::new(3), PlayerId::new(0)]
    );
}
