//! Chairman/director derivation from ownership.
//!
//! Chairman requires the chairman threshold (default 50%) of a stock's
//! total issued quantity; director requires the director threshold (default
//! 25%) and must not be the chairman.
//!
//! Incumbency stickiness: an incumbent who still meets their threshold
//! keeps the title even if another player now holds more. This prevents
//! title oscillation on near-tied positions. Titles are recomputed after
//! every trade, not only at round boundaries.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::config::GameConfig;
use crate::core::error::EngineResult;
use crate::core::state::GameState;
use crate::core::{PlayerId, Symbol};

/// One leader's seat in the exclusion phase: the stocks they chair, and the
/// chairman-less stocks they direct.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Leader {
    /// The player holding leadership.
    pub player: PlayerId,
    /// Stocks this player chairs.
    pub chaired: Vec<Symbol>,
    /// Stocks this player directs where no chairman exists.
    pub directed: Vec<Symbol>,
}

/// A player's ownership percentage of a stock's total issued quantity.
#[must_use]
pub fn ownership_pct(quantity: u64, total: u64) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    Decimal::from(quantity) / Decimal::from(total) * Decimal::from(100)
}

/// Recompute chairman and director for one stock.
pub fn recompute(state: &mut GameState, symbol: &Symbol, config: &GameConfig) -> EngineResult<()> {
    let total = state.stock(symbol)?.total;
    let pct_of = |state: &GameState, player: PlayerId| {
        ownership_pct(state.players[player].quantity_of(symbol), total)
    };

    let incumbent_chairman = state.stock(symbol)?.chairman;
    let chairman = match incumbent_chairman {
        Some(p) if pct_of(state, p) >= config.chairman_pct => Some(p),
        _ => best_qualifying(state, symbol, total, config.chairman_pct, None),
    };

    let incumbent_director = state.stock(symbol)?.director;
    let director = match incumbent_director {
        Some(p) if Some(p) != chairman && pct_of(state, p) >= config.director_pct => Some(p),
        _ => best_qualifying(state, symbol, total, config.director_pct, chairman),
    };

    let stock = state.stock_mut(symbol)?;
    stock.chairman = chairman;
    stock.director = director;
    Ok(())
}

/// Recompute titles for every stock.
pub fn recompute_all(state: &mut GameState, config: &GameConfig) -> EngineResult<()> {
    let symbols: Vec<Symbol> = state.stocks.keys().cloned().collect();
    for symbol in symbols {
        recompute(state, &symbol, config)?;
    }
    Ok(())
}

/// The highest qualifying holder at `threshold`, excluding `exclude`.
/// Ties break to the lowest seat for determinism.
fn best_qualifying(
    state: &GameState,
    symbol: &Symbol,
    total: u64,
    threshold: Decimal,
    exclude: Option<PlayerId>,
) -> Option<PlayerId> {
    state
        .players
        .iter()
        .filter(|(id, _)| Some(*id) != exclude)
        .map(|(id, p)| (id, ownership_pct(p.quantity_of(symbol), total)))
        .filter(|(_, pct)| *pct >= threshold)
        .max_by(|(a_id, a_pct), (b_id, b_pct)| {
            a_pct.cmp(b_pct).then(b_id.cmp(a_id)) // highest pct, lowest seat
        })
        .map(|(id, _)| id)
}

/// The ordered leader list for the exclusion phase: players chairing any
/// stock first, then pure directors, each in seat order; every leader
/// appears once with all stocks they lead.
///
/// Director entries only cover stocks with no chairman; a chairman on a
/// stock always supersedes its director.
#[must_use]
pub fn leaders(state: &GameState) -> Vec<Leader> {
    let mut entries: Vec<Leader> = Vec::new();

    let mut entry_for = |entries: &mut Vec<Leader>, player: PlayerId| -> usize {
        if let Some(pos) = entries.iter().position(|l| l.player == player) {
            pos
        } else {
            entries.push(Leader {
                player,
                chaired: Vec::new(),
                directed: Vec::new(),
            });
            entries.len() - 1
        }
    };

    // Stocks iterate in symbol order, so leader order is deterministic.
    for (symbol, stock) in &state.stocks {
        if let Some(chairman) = stock.chairman {
            let pos = entry_for(&mut entries, chairman);
            entries[pos].chaired.push(symbol.clone());
        } else if let Some(director) = stock.director {
            let pos = entry_for(&mut entries, director);
            entries[pos].directed.push(symbol.clone());
        }
    }

    // Chairmen first, then pure directors; seat order within each group.
    entries.sort_by_key(|l| (l.chaired.is_empty(), l.player));
    entries
}
