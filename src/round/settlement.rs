//! Round settlement: the atomic batch operation at a round boundary.
//!
//! Runs only after the exclusion phase completed, or immediately at round
//! end when no stock has a leader. Steps, in order: drop vetoed stock
//! events; apply surviving impacts per stock in one batch; apply the net
//! cash impact to every player; record price history; auto-settle unplayed
//! corporate cards; expire rights issues; advance the round or complete the
//! game; deal the next round's hands.
//!
//! The whole operation either fully applies or fails; a partial settlement
//! would corrupt the conservation and price-history invariants.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cards::corporate::{CorporateActionKind, RightsStatus};
use crate::cards::deck;
use crate::core::config::GameConfig;
use crate::core::error::EngineResult;
use crate::core::state::{GameState, RoundPhase};
use crate::core::{ActionCardId, EventId, PlayerId, Symbol};
use crate::corporate::{self, BonusReport, DividendReport};
use crate::leadership::tracker;
use crate::market::pricing;

/// One event's contribution to a stock's round move.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventImpact {
    pub event: EventId,
    /// Price delta.
    pub impact: Decimal,
    /// Display percent against the pre-round price.
    pub percent: Decimal,
}

/// A stock's settled price move for the round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceMove {
    pub symbol: Symbol,
    pub old_price: Decimal,
    pub new_price: Decimal,
    pub events: Vec<EventImpact>,
}

/// Everything one settlement did.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SettlementReport {
    /// The round that settled.
    pub round: u32,
    /// Per-stock moves, for stocks that had surviving events.
    pub price_moves: Vec<PriceMove>,
    /// Net cash percent applied to every player (zero when no cash events).
    pub cash_net_pct: Decimal,
    /// Dividends auto-settled for unplayed cards.
    pub auto_dividends: Vec<DividendReport>,
    /// Bonus issues auto-settled for unplayed cards.
    pub auto_bonuses: Vec<BonusReport>,
    /// Rights issues that expired at this boundary.
    pub expired_rights: Vec<ActionCardId>,
    /// True when this was the final round.
    pub game_over: bool,
}

/// Settle the current round.
pub fn process(state: &mut GameState, config: &GameConfig) -> EngineResult<SettlementReport> {
    let round = state.round;
    state.phase = RoundPhase::Settling;

    // (1)-(2) partition the round's events and drop vetoed stock events
    let mut stock_impacts: BTreeMap<Symbol, Vec<(EventId, Decimal)>> = BTreeMap::new();
    let mut cash_net_pct = Decimal::ZERO;
    for event in state.current_round_events() {
        if event.is_cash_event() {
            cash_net_pct += event.impact;
        } else if !event.is_excluded() {
            for symbol in &event.affected {
                stock_impacts
                    .entry(symbol.clone())
                    .or_default()
                    .push((event.id, event.impact));
            }
        }
    }

    // (3) apply summed impacts per stock, percentages against the pre-round price
    let mut price_moves = Vec::with_capacity(stock_impacts.len());
    for (symbol, impacts) in stock_impacts {
        let old_price = state.stock(&symbol)?.price;
        let deltas: Vec<Decimal> = impacts.iter().map(|(_, d)| *d).collect();
        let new_price = pricing::apply_impacts(old_price, &deltas, Decimal::ZERO)?;
        state.stock_mut(&symbol)?.price = new_price;

        let events = impacts
            .into_iter()
            .map(|(event, impact)| EventImpact {
                event,
                impact,
                percent: pricing::percent_change(impact, old_price),
            })
            .collect();
        debug!(%symbol, %old_price, %new_price, "price settled");
        price_moves.push(PriceMove {
            symbol,
            old_price,
            new_price,
            events,
        });
    }

    // (4) net cash impact, once per player
    if !cash_net_pct.is_zero() {
        for (_, player) in state.players.iter_mut() {
            player.cash = pricing::apply_cash_impact(player.cash, cash_net_pct);
        }
    }

    // (5) one history point per stock
    for stock in state.stocks.values_mut() {
        stock.record_history(round);
    }

    // (6) auto-settle corporate cards dealt this round but never played
    let mut unplayed: Vec<ActionCardId> = state
        .corporate_actions
        .iter()
        .filter(|(_, c)| c.round == round && !c.played)
        .map(|(id, _)| *id)
        .collect();
    unplayed.sort();

    let mut auto_dividends = Vec::new();
    let mut auto_bonuses = Vec::new();
    for id in unplayed {
        let (kind, owner) = {
            let card = state.corporate(id)?;
            (card.kind.clone(), card.owner)
        };
        match kind {
            CorporateActionKind::Dividend { pct } => {
                let symbol = default_symbol_for(state, owner);
                auto_dividends.push(corporate::pay_dividend(state, &symbol, pct)?);
                let card = state.corporate_mut(id)?;
                card.played = true;
                card.symbol = Some(symbol);
            }
            CorporateActionKind::BonusIssue { base, ratio } => {
                let symbol = default_symbol_for(state, owner);
                auto_bonuses.push(corporate::bonus_issue(state, &symbol, base, ratio)?);
                let card = state.corporate_mut(id)?;
                card.played = true;
                card.symbol = Some(symbol);
            }
            CorporateActionKind::RightsIssue { .. } => {
                // Unplayed rights issues simply expire
                let card = state.corporate_mut(id)?;
                if let CorporateActionKind::RightsIssue { status, .. } = &mut card.kind {
                    *status = RightsStatus::Expired;
                }
            }
        }
    }

    // (7) close every subscription window still open
    let expired_rights = corporate::expire_all_rights(state);

    // Bonus issues moved holdings; titles follow ownership immediately
    tracker::recompute_all(state, config)?;
    state.check_conservation()?;

    // (8) advance or complete
    let game_over = round + 1 > config.max_rounds;
    state.complete = game_over;
    state.phase = RoundPhase::Trading;
    if !game_over {
        state.round = round + 1;
        state.turn_in_round = 1;
        state.current_player = PlayerId::new(0);
        // (9) next round's hands
        deck::deal_round(state, config);
    }

    info!(
        round,
        game_over,
        moves = price_moves.len(),
        %cash_net_pct,
        "round settled"
    );

    Ok(SettlementReport {
        round,
        price_moves,
        cash_net_pct,
        auto_dividends,
        auto_bonuses,
        expired_rights,
        game_over,
    })
}

/// Deterministic symbol choice for auto-settled cards: the owner's largest
/// holding, ties to the first symbol in order; the first listed stock when
/// the owner holds nothing.
fn default_symbol_for(state: &GameState, owner: PlayerId) -> Symbol {
    let holdings = &state.players[owner].holdings;
    holdings
        .iter()
        .filter(|(_, h)| h.quantity > 0)
        .max_by(|(a_sym, a), (b_sym, b)| a.quantity.cmp(&b.quantity).then(b_sym.cmp(a_sym)))
        .map(|(symbol, _)| symbol.clone())
        .unwrap_or_else(|| {
            state
                .stocks
                .keys()
                .next()
                .cloned()
                .expect("config guarantees at least one stock")
        })
}
