//! Complete game state.
//!
//! One `GameState` per game instance, mutated only through engine
//! operations (single-writer model). Entities are id-keyed; stocks and
//! holdings use ordered maps so every iteration the engine performs is
//! deterministic given the seed.

use im::Vector;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::config::GameConfig;
use super::error::{EngineError, EngineResult};
use super::ids::{ActionCardId, EventId, Symbol};
use super::money::round_cents;
use super::player::{PlayerId, PlayerMap};
use super::rng::GameRng;
use crate::cards::corporate::CorporateAction;
use crate::cards::deck::CardDeck;
use crate::cards::event::MarketEvent;
use crate::leadership::exclusion::ExclusionStatus;
use crate::market::stock::{Holding, Stock};

/// Where the game is within a round.
///
/// The exclusion phase is an explicit state, not a sentinel turn counter:
/// while `AwaitingExclusion`, trading and end-turn are rejected until the
/// veto phase completes and settlement runs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Players are trading and playing cards.
    Trading,
    /// Round is over; stock leaders are taking their veto window.
    AwaitingExclusion(ExclusionStatus),
    /// Settlement in progress. Transient; never observed between operations.
    Settling,
}

impl RoundPhase {
    /// Short name for error messages.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            RoundPhase::Trading => "trading",
            RoundPhase::AwaitingExclusion(_) => "awaiting exclusion",
            RoundPhase::Settling => "settling",
        }
    }
}

/// Kind of an audit-log entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnActionKind {
    Buy,
    Sell,
    Skip,
    PlayCorporate,
    SubscribeRights,
    Veto,
}

/// One append-only audit-log entry on a player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurnAction {
    /// Round the action happened in.
    pub round: u32,
    /// What kind of action.
    pub kind: TurnActionKind,
    /// Human-readable description.
    pub description: String,
}

/// One player's state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Display name.
    pub name: String,
    /// Cash balance (>= 0).
    pub cash: Decimal,
    /// Positions keyed by symbol; entries are removed when flat.
    pub holdings: BTreeMap<Symbol, Holding>,
    /// Event cards dealt for the current round.
    pub hand_events: Vec<EventId>,
    /// Corporate-action cards dealt for the current round.
    pub hand_actions: Vec<ActionCardId>,
    /// Append-only audit log.
    pub actions: Vector<TurnAction>,
}

impl Player {
    fn new(name: String, cash: Decimal) -> Self {
        Self {
            name,
            cash,
            holdings: BTreeMap::new(),
            hand_events: Vec::new(),
            hand_actions: Vec::new(),
            actions: Vector::new(),
        }
    }

    /// Shares held of a stock (0 when flat).
    #[must_use]
    pub fn quantity_of(&self, symbol: &Symbol) -> u64 {
        self.holdings.get(symbol).map_or(0, |h| h.quantity)
    }
}

/// Complete state of one game.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameState {
    /// Current round, starting at 1.
    pub round: u32,
    /// Turn within the round, starting at 1. One turn is a full rotation.
    pub turn_in_round: u32,
    /// Whose turn it is.
    pub current_player: PlayerId,
    /// Set when the final round has settled.
    pub complete: bool,
    /// Phase within the round.
    pub phase: RoundPhase,

    /// Players in seat order.
    pub players: PlayerMap<Player>,
    /// Stocks keyed by symbol, iterated in symbol order.
    pub stocks: BTreeMap<Symbol, Stock>,
    /// Every event card dealt over the game, by id.
    pub events: FxHashMap<EventId, MarketEvent>,
    /// Event ids of the current round in deal order.
    pub round_events: Vec<EventId>,
    /// Every corporate-action card dealt over the game, by id.
    pub corporate_actions: FxHashMap<ActionCardId, CorporateAction>,

    /// Event deck (pool + sampling state).
    pub deck: CardDeck,
    /// Deterministic RNG; all randomness flows through here.
    pub rng: GameRng,

    next_event_id: u32,
    next_action_id: u32,
}

impl GameState {
    /// Build the initial state: players funded, stocks listed, deck built.
    /// Round 1 hands are dealt by the caller (see `cards::deck::deal_round`).
    pub fn new(config: &GameConfig, player_names: &[String], seed: u64) -> EngineResult<Self> {
        config.validate()?;
        if player_names.len() < 2 {
            return Err(EngineError::validation("at least 2 players required"));
        }
        if player_names.len() > 8 {
            return Err(EngineError::validation("at most 8 players supported"));
        }

        let players = PlayerMap::new(player_names.len(), |p| {
            Player::new(player_names[p.index()].clone(), config.starting_cash)
        });

        let stocks = config
            .stocks
            .iter()
            .map(|spec| {
                (
                    spec.symbol.clone(),
                    Stock::new(spec.symbol.clone(), spec.price, spec.total_quantity),
                )
            })
            .collect();

        Ok(Self {
            round: 1,
            turn_in_round: 1,
            current_player: PlayerId::new(0),
            complete: false,
            phase: RoundPhase::Trading,
            players,
            stocks,
            events: FxHashMap::default(),
            round_events: Vec::new(),
            corporate_actions: FxHashMap::default(),
            deck: CardDeck::new(config),
            rng: GameRng::new(seed),
            next_event_id: 0,
            next_action_id: 0,
        })
    }

    /// Number of seats.
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players.player_count()
    }

    // === Id allocation ===

    /// Allocate the next event id.
    pub fn alloc_event_id(&mut self) -> EventId {
        let id = EventId::new(self.next_event_id);
        self.next_event_id += 1;
        id
    }

    /// Allocate the next corporate-action card id.
    pub fn alloc_action_id(&mut self) -> ActionCardId {
        let id = ActionCardId::new(self.next_action_id);
        self.next_action_id += 1;
        id
    }

    // === Lookups ===

    /// Get a stock by symbol.
    pub fn stock(&self, symbol: &Symbol) -> EngineResult<&Stock> {
        self.stocks
            .get(symbol)
            .ok_or_else(|| EngineError::not_found("stock", symbol))
    }

    /// Get a mutable stock by symbol.
    pub fn stock_mut(&mut self, symbol: &Symbol) -> EngineResult<&mut Stock> {
        self.stocks
            .get_mut(symbol)
            .ok_or_else(|| EngineError::not_found("stock", symbol))
    }

    /// Get an event by id.
    pub fn event(&self, id: EventId) -> EngineResult<&MarketEvent> {
        self.events
            .get(&id)
            .ok_or_else(|| EngineError::not_found("event", id))
    }

    /// Get a mutable event by id.
    pub fn event_mut(&mut self, id: EventId) -> EngineResult<&mut MarketEvent> {
        self.events
            .get_mut(&id)
            .ok_or_else(|| EngineError::not_found("event", id))
    }

    /// Get a corporate-action card by id.
    pub fn corporate(&self, id: ActionCardId) -> EngineResult<&CorporateAction> {
        self.corporate_actions
            .get(&id)
            .ok_or_else(|| EngineError::not_found("corporate action", id))
    }

    /// Get a mutable corporate-action card by id.
    pub fn corporate_mut(&mut self, id: ActionCardId) -> EngineResult<&mut CorporateAction> {
        self.corporate_actions
            .get_mut(&id)
            .ok_or_else(|| EngineError::not_found("corporate action", id))
    }

    /// Current-round events in deal order.
    pub fn current_round_events(&self) -> impl Iterator<Item = &MarketEvent> {
        self.round_events.iter().filter_map(|id| self.events.get(id))
    }

    /// Players holding shares of a stock, in seat order.
    #[must_use]
    pub fn holders_of(&self, symbol: &Symbol) -> Vec<(PlayerId, u64)> {
        self.players
            .iter()
            .filter_map(|(id, p)| {
                let qty = p.quantity_of(symbol);
                (qty > 0).then_some((id, qty))
            })
            .collect()
    }

    // === Audit log ===

    /// Append an entry to a player's audit log.
    pub fn log_action(
        &mut self,
        player: PlayerId,
        kind: TurnActionKind,
        description: impl Into<String>,
    ) {
        let round = self.round;
        self.players[player].actions.push_back(TurnAction {
            round,
            kind,
            description: description.into(),
        });
    }

    // === Invariants and reports ===

    /// Verify the share-conservation invariant for every stock:
    /// `sum of holdings + available == total`.
    pub fn check_conservation(&self) -> EngineResult<()> {
        for (symbol, stock) in &self.stocks {
            let held: u64 = self
                .players
                .iter()
                .map(|(_, p)| p.quantity_of(symbol))
                .sum();
            if held + stock.available != stock.total {
                return Err(EngineError::internal(format!(
                    "conservation violated for {symbol}: held {held} + available {} != total {}",
                    stock.available, stock.total
                )));
            }
        }
        Ok(())
    }

    /// A player's net worth: cash plus holdings at current prices.
    #[must_use]
    pub fn net_worth(&self, player: PlayerId) -> Decimal {
        let p = &self.players[player];
        let positions: Decimal = p
            .holdings
            .iter()
            .map(|(symbol, h)| {
                let price = self.stocks.get(symbol).map_or(Decimal::ZERO, |s| s.price);
                price * Decimal::from(h.quantity)
            })
            .sum();
        round_cents(p.cash + positions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::money::dec;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("Player {i}")).collect()
    }

    #[test]
    fn test_new_state() {
        let config = GameConfig::default();
        let state = GameState::new(&config, &names(3), 42).unwrap();

        assert_eq!(state.round, 1);
        assert_eq!(state.turn_in_round, 1);
        assert_eq!(state.current_player, PlayerId::new(0));
        assert_eq!(state.phase, RoundPhase::Trading);
        assert_eq!(state.player_count(), 3);
        assert_eq!(state.stocks.len(), 4);
        assert_eq!(state.players[PlayerId::new(1)].cash, dec(10_000));
        state.check_conservation().unwrap();
    }

    #[test]
    fn test_player_count_bounds() {
        let config = GameConfig::default();
        assert!(GameState::new(&config, &names(1), 42).is_err());
        assert!(GameState::new(&config, &names(9), 42).is_err());
        assert!(GameState::new(&config, &names(8), 42).is_ok());
    }

    #[test]
    fn test_id_allocation_is_monotonic() {
        let config = GameConfig::default();
        let mut state = GameState::new(&config, &names(2), 42).unwrap();

        assert_eq!(state.alloc_event_id(), EventId::new(0));
        assert_eq!(state.alloc_event_id(), EventId::new(1));
        assert_eq!(state.alloc_action_id(), ActionCardId::new(0));
    }

    #[test]
    fn test_conservation_detects_violation() {
        let config = GameConfig::default();
        let mut state = GameState::new(&config, &names(2), 42).unwrap();

        let symbol = Symbol::new("TECH");
        state
            .players[PlayerId::new(0)]
            .holdings
            .insert(symbol, Holding { quantity: 10, avg_cost: dec(100) });

        // Holdings grew without available shrinking
        assert!(state.check_conservation().is_err());
    }

    #[test]
    fn test_net_worth() {
        let config = GameConfig::default();
        let mut state = GameState::new(&config, &names(2), 42).unwrap();

        let symbol = Symbol::new("TECH");
        let p0 = PlayerId::new(0);
        state.players[p0].cash = dec(500);
        state.players[p0]
            .holdings
            .insert(symbol, Holding { quantity: 3, avg_cost: dec(90) });

        // 500 + 3 * 100
        assert_eq!(state.net_worth(p0), dec(800));
    }

    #[test]
    fn test_unknown_lookups_fail() {
        let config = GameConfig::default();
        let state = GameState::new(&config, &names(2), 42).unwrap();

        assert!(state.stock(&Symbol::new("OIL")).is_err());
        assert!(state.event(EventId::new(99)).is_err());
        assert!(state.corporate(ActionCardId::new(99)).is_err());
    }
}
