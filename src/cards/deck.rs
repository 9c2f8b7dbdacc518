//! Event and corporate-action card generation.
//!
//! The deck holds a fixed pool of event templates (a spread of impacts per
//! listed stock plus two all-cash cards) and samples it without
//! replacement, weighted by severity. The pool resets once exhausted.
//!
//! From a configured round onward, each draw first rolls for a rare market
//! crash, then for a bull run; either overrides the pool draw with an
//! extreme event on one randomly chosen stock.
//!
//! Hands are dealt per player per round: the corporate/event type sequence
//! is a Fisher-Yates shuffle of the exact type counts, and cards are then
//! generated in shuffled order.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smallvec::smallvec;
use tracing::info;

use super::corporate::{CorporateAction, CorporateActionKind, RightsStatus};
use super::event::{MarketEvent, Severity};
use crate::core::config::GameConfig;
use crate::core::rng::GameRng;
use crate::core::state::GameState;
use crate::core::Symbol;

/// One entry in the event pool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventTemplate {
    /// Display headline.
    pub headline: String,
    /// Affected stock; `None` for cash (inflation/deflation) cards.
    pub symbol: Option<Symbol>,
    /// Price delta, or cash percent for cash cards.
    pub impact: Decimal,
}

/// A drawn event before it is bound to an owner and round.
#[derive(Clone, Debug, PartialEq)]
pub struct EventDraft {
    pub headline: String,
    pub symbol: Option<Symbol>,
    pub impact: Decimal,
}

/// Card type sequence entry for hand dealing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardType {
    Event,
    Corporate,
}

/// Stateful event-card generator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardDeck {
    templates: Vec<EventTemplate>,
    /// Indices into `templates` not yet drawn in the current pass.
    remaining: Vec<usize>,
}

impl CardDeck {
    /// Build the pool from the configured listings.
    #[must_use]
    pub fn new(config: &GameConfig) -> Self {
        let mut templates = Vec::new();

        for spec in &config.stocks {
            for magnitude in [5i64, 10, 15, 20, 25, 30] {
                for sign in [1i64, -1] {
                    let impact = Decimal::from(sign * magnitude);
                    templates.push(EventTemplate {
                        headline: stock_headline(&spec.symbol, impact),
                        symbol: Some(spec.symbol.clone()),
                        impact,
                    });
                }
            }
        }

        templates.push(EventTemplate {
            headline: "Inflation spike erodes cash balances".to_string(),
            symbol: None,
            impact: config.inflation_pct,
        });
        templates.push(EventTemplate {
            headline: "Falling prices boost purchasing power".to_string(),
            symbol: None,
            impact: config.deflation_pct,
        });

        let remaining = (0..templates.len()).collect();
        Self {
            templates,
            remaining,
        }
    }

    /// Number of templates still undrawn in the current pass.
    #[must_use]
    pub fn remaining_count(&self) -> usize {
        self.remaining.len()
    }

    /// Draw one event.
    ///
    /// Crash is rolled first, then bull run, then the weighted pool.
    pub fn draw_event(
        &mut self,
        rng: &mut GameRng,
        round: u32,
        config: &GameConfig,
        symbols: &[Symbol],
    ) -> EventDraft {
        if round >= config.rare_event_min_round && !symbols.is_empty() {
            if rng.gen_bool(config.rare_event_chance) {
                let symbol = rng.choose(symbols).cloned();
                if let Some(symbol) = symbol {
                    return EventDraft {
                        headline: format!("Market crash wipes out {symbol}"),
                        symbol: Some(symbol),
                        impact: config.crash_impact,
                    };
                }
            }
            if rng.gen_bool(config.rare_event_chance) {
                let symbol = rng.choose(symbols).cloned();
                if let Some(symbol) = symbol {
                    return EventDraft {
                        headline: format!("Speculative frenzy sweeps {symbol}"),
                        symbol: Some(symbol),
                        impact: config.bull_run_impact,
                    };
                }
            }
        }

        self.draw_from_pool(rng)
    }

    fn draw_from_pool(&mut self, rng: &mut GameRng) -> EventDraft {
        if self.remaining.is_empty() {
            self.remaining = (0..self.templates.len()).collect();
        }

        let weights: Vec<f32> = self
            .remaining
            .iter()
            .map(|&i| Severity::from_impact(self.templates[i].impact).draw_weight())
            .collect();

        // Weights are always positive, so a pick always exists.
        let pos = rng.choose_weighted(&weights).unwrap_or(0);
        let idx = self.remaining.swap_remove(pos);
        let template = &self.templates[idx];

        EventDraft {
            headline: template.headline.clone(),
            symbol: template.symbol.clone(),
            impact: template.impact,
        }
    }

    /// Generate one corporate-action card, uniformly among the three kinds.
    /// No symbol is bound; the owner chooses one at play time.
    pub fn draw_corporate(rng: &mut GameRng, config: &GameConfig) -> CorporateActionKind {
        match rng.gen_range_usize(0..3) {
            0 => CorporateActionKind::Dividend {
                pct: config.dividend_pct,
            },
            1 => CorporateActionKind::RightsIssue {
                base: config.rights_base_shares,
                ratio: config.rights_ratio,
                price_pct: config.rights_price_pct,
                status: RightsStatus::Pending,
                eligible: Vec::new(),
                expires_at: None,
            },
            _ => CorporateActionKind::BonusIssue {
                base: config.bonus_base_shares,
                ratio: config.bonus_ratio,
            },
        }
    }

    /// The shuffled card-type sequence for one hand.
    pub fn hand_mix(rng: &mut GameRng, config: &GameConfig) -> Vec<CardType> {
        let corporate = config.corporate_cards_per_hand();
        let mut mix = vec![CardType::Corporate; corporate];
        mix.resize(config.hand_size, CardType::Event);
        rng.shuffle(&mut mix);
        mix
    }
}

/// Deal the current round's hands to every player.
///
/// Clears previous-round hands and the round event list first, so this is
/// also what turns the page between rounds.
pub fn deal_round(state: &mut GameState, config: &GameConfig) {
    state.round_events.clear();
    for (_, player) in state.players.iter_mut() {
        player.hand_events.clear();
        player.hand_actions.clear();
    }

    let symbols: Vec<Symbol> = state.stocks.keys().cloned().collect();
    let players: Vec<_> = state.players.player_ids().collect();
    let round = state.round;

    for player in players {
        let mix = CardDeck::hand_mix(&mut state.rng, config);
        for card_type in mix {
            match card_type {
                CardType::Event => {
                    let draft = {
                        let GameState { deck, rng, .. } = state;
                        deck.draw_event(rng, round, config, &symbols)
                    };
                    let id = state.alloc_event_id();
                    let affected = match draft.symbol {
                        Some(symbol) => smallvec![symbol],
                        None => smallvec![],
                    };
                    let event = MarketEvent {
                        id,
                        headline: draft.headline,
                        severity: Severity::from_impact(draft.impact),
                        affected,
                        impact: draft.impact,
                        owner: player,
                        round,
                        excluded_by: None,
                    };
                    state.events.insert(id, event);
                    state.round_events.push(id);
                    state.players[player].hand_events.push(id);
                }
                CardType::Corporate => {
                    let kind = CardDeck::draw_corporate(&mut state.rng, config);
                    let id = state.alloc_action_id();
                    let card = CorporateAction {
                        id,
                        kind,
                        owner: player,
                        round,
                        played: false,
                        symbol: None,
                    };
                    state.corporate_actions.insert(id, card);
                    state.players[player].hand_actions.push(id);
                }
            }
        }
    }

    info!(
        round,
        events = state.round_events.len(),
        "dealt hands for round"
    );
}

fn stock_headline(symbol: &Symbol, impact: Decimal) -> String {
    let up = impact > Decimal::ZERO;
    let phrase = match (Severity::from_impact(impact), up) {
        (Severity::Low, true) => "edges up on steady demand",
        (Severity::Low, false) => "dips on light profit-taking",
        (Severity::Medium, true) => "beats quarterly estimates",
        (Severity::Medium, false) => "misses quarterly estimates",
        (Severity::High, true) => "announces a breakthrough product",
        (Severity::High, false) => "faces a regulatory probe",
        (Severity::Extreme, true) => "posts record earnings",
        (Severity::Extreme, false) => "hit by accounting scandal",
    };
    format!("{symbol} {phrase}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::money::dec;
    use crate::core::PlayerId;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("Player {i}")).collect()
    }

    #[test]
    fn test_pool_size() {
        let config = GameConfig::default();
        let deck = CardDeck::new(&config);
        // 4 stocks * 6 magnitudes * 2 signs + 2 cash cards
        assert_eq!(deck.remaining_count(), 4 * 12 + 2);
    }

    #[test]
    fn test_pool_samples_without_replacement_and_resets() {
        let config = GameConfig::default();
        let mut deck = CardDeck::new(&config);
        let mut rng = GameRng::new(42);
        let total = deck.remaining_count();

        let mut drawn = Vec::new();
        for _ in 0..total {
            // Round 1: no rare overrides possible
            drawn.push(deck.draw_event(&mut rng, 1, &config, &[]));
        }
        assert_eq!(deck.remaining_count(), 0);

        // No duplicates within one pass
        let mut headlines: Vec<_> = drawn.iter().map(|d| &d.headline).collect();
        headlines.sort();
        headlines.dedup();
        assert_eq!(headlines.len(), total);

        // Pool resets once exhausted
        deck.draw_event(&mut rng, 1, &config, &[]);
        assert_eq!(deck.remaining_count(), total - 1);
    }

    #[test]
    fn test_rare_overrides_only_after_min_round() {
        let mut config = GameConfig::default();
        config.rare_event_chance = 1.0; // force the roll
        let symbols = vec![Symbol::new("TECH")];

        let mut deck = CardDeck::new(&config);
        let mut rng = GameRng::new(42);

        // Round 2: below the minimum, the roll never happens
        let draft = deck.draw_event(&mut rng, 2, &config, &symbols);
        assert_ne!(draft.impact, config.crash_impact);

        // Round 3: crash is rolled first and wins
        let draft = deck.draw_event(&mut rng, 3, &config, &symbols);
        assert_eq!(draft.impact, dec(-35));
        assert_eq!(draft.symbol, Some(Symbol::new("TECH")));
        assert_eq!(Severity::from_impact(draft.impact), Severity::Extreme);
    }

    #[test]
    fn test_hand_mix_counts() {
        let config = GameConfig::default();
        let mut rng = GameRng::new(42);

        let mix = CardDeck::hand_mix(&mut rng, &config);
        assert_eq!(mix.len(), 10);
        let corporate = mix.iter().filter(|t| **t == CardType::Corporate).count();
        assert_eq!(corporate, 1);
    }

    #[test]
    fn test_draw_corporate_covers_all_kinds() {
        let config = GameConfig::default();
        let mut rng = GameRng::new(42);

        let mut seen = [false; 3];
        for _ in 0..100 {
            match CardDeck::draw_corporate(&mut rng, &config) {
                CorporateActionKind::Dividend { .. } => seen[0] = true,
                CorporateActionKind::RightsIssue { status, .. } => {
                    assert_eq!(status, RightsStatus::Pending);
                    seen[1] = true;
                }
                CorporateActionKind::BonusIssue { .. } => seen[2] = true,
            }
        }
        assert_eq!(seen, [true, true, true]);
    }

    #[test]
    fn test_deal_round_fills_hands() {
        let config = GameConfig::default();
        let mut state = GameState::new(&config, &names(3), 42).unwrap();

        deal_round(&mut state, &config);

        for player in PlayerId::all(3) {
            let p = &state.players[player];
            assert_eq!(p.hand_events.len() + p.hand_actions.len(), 10);
            assert_eq!(p.hand_actions.len(), 1);
            for id in &p.hand_events {
                let event = state.events.get(id).unwrap();
                assert_eq!(event.owner, player);
                assert_eq!(event.round, 1);
                assert!(!event.is_excluded());
            }
        }
        assert_eq!(state.round_events.len(), 27); // 3 players * 9 events
    }

    #[test]
    fn test_deal_round_is_seed_deterministic() {
        let config = GameConfig::default();
        let mut a = GameState::new(&config, &names(2), 7).unwrap();
        let mut b = GameState::new(&config, &names(2), 7).unwrap();

        deal_round(&mut a, &config);
        deal_round(&mut b, &config);

        let ea: Vec<_> = a.current_round_events().map(|e| e.headline.clone()).collect();
        let eb: Vec<_> = b.current_round_events().map(|e| e.headline.clone()).collect();
        assert_eq!(ea, eb);
    }
}
