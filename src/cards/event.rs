//! Market-event cards.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{EventId, PlayerId, Symbol};

/// Event severity, derived purely from the impact magnitude.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Extreme,
}

impl Severity {
    /// Severity from the absolute price impact.
    ///
    /// Cards are printed at magnitudes 5 (low), 10/15 (medium), 20/25
    /// (high) and 30+ (extreme); intermediate values bucket the same way.
    #[must_use]
    pub fn from_impact(impact: Decimal) -> Self {
        let magnitude = impact.abs();
        if magnitude < Decimal::from(10) {
            Severity::Low
        } else if magnitude < Decimal::from(20) {
            Severity::Medium
        } else if magnitude < Decimal::from(30) {
            Severity::High
        } else {
            Severity::Extreme
        }
    }

    /// Sampling weight for deck draws: low cards are common, medium less
    /// so, high and extreme rare.
    #[must_use]
    pub fn draw_weight(self) -> f32 {
        match self {
            Severity::Low => 5.0,
            Severity::Medium => 3.0,
            Severity::High | Severity::Extreme => 1.0,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Extreme => "extreme",
        };
        write!(f, "{s}")
    }
}

/// One market-event card, dealt to a player for one round and consumed
/// exactly once at that round's settlement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketEvent {
    /// Unique id within the game.
    pub id: EventId,
    /// Display headline.
    pub headline: String,
    /// Severity bucket (derived from `impact` at creation).
    pub severity: Severity,
    /// Affected stock symbols. Empty means a cash event: the impact is a
    /// percent applied to every player's cash at settlement.
    pub affected: SmallVec<[Symbol; 2]>,
    /// Price delta for stock events; percent of cash for cash events.
    pub impact: Decimal,
    /// The player this card was dealt to.
    pub owner: PlayerId,
    /// The round the card belongs to.
    pub round: u32,
    /// Set when a leader vetoes the event during the exclusion phase.
    pub excluded_by: Option<PlayerId>,
}

impl MarketEvent {
    /// Is this a cash (inflation/deflation) event rather than a stock event?
    #[must_use]
    pub fn is_cash_event(&self) -> bool {
        self.affected.is_empty()
    }

    /// Does this event move the given stock?
    #[must_use]
    pub fn affects(&self, symbol: &Symbol) -> bool {
        self.affected.iter().any(|s| s == symbol)
    }

    /// Has a leader vetoed this event?
    #[must_use]
    pub fn is_excluded(&self) -> bool {
        self.excluded_by.is_some()
    }
}
