//! Corporate-action cards.
//!
//! A corporate-action card is dealt without a stock symbol; the owner binds
//! one at play time. Dividends and bonus issues settle immediately on play;
//! rights issues open a subscription window that closes when the playing
//! player's turn comes around again, or at round end, whichever first.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{ActionCardId, PlayerId, Symbol};

/// Lifecycle of a rights issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RightsStatus {
    /// Dealt but not yet played.
    Pending,
    /// Played; eligible shareholders may subscribe.
    Active,
    /// Window closed; no further subscription.
    Expired,
}

/// Kind-specific details of a corporate action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CorporateActionKind {
    /// Pay every shareholder `quantity × price × pct/100`.
    Dividend {
        /// Payout percent of price per share.
        pct: Decimal,
    },
    /// Let shareholders at play time buy `ratio` discounted shares per
    /// `base` held.
    RightsIssue {
        /// Entitlement base ("1-for-2" => 2).
        base: u64,
        /// Shares granted per base.
        ratio: u64,
        /// Subscription price as percent of market price.
        price_pct: Decimal,
        /// Window state.
        status: RightsStatus,
        /// Shareholders snapshotted at play time; only they may subscribe.
        eligible: Vec<PlayerId>,
        /// The playing player; the window closes when their turn arrives.
        expires_at: Option<PlayerId>,
    },
    /// Grant `ratio` free shares per `base` held, capped by total issuance.
    BonusIssue {
        /// Entitlement base ("1-for-5" => 5).
        base: u64,
        /// Shares granted per base.
        ratio: u64,
    },
}

impl CorporateActionKind {
    /// Short name for logs and audit entries.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            CorporateActionKind::Dividend { .. } => "dividend",
            CorporateActionKind::RightsIssue { .. } => "rights issue",
            CorporateActionKind::BonusIssue { .. } => "bonus issue",
        }
    }
}

/// One corporate-action card.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CorporateAction {
    /// Unique id within the game.
    pub id: ActionCardId,
    /// Kind and parameters.
    pub kind: CorporateActionKind,
    /// The player this card was dealt to.
    pub owner: PlayerId,
    /// The round the card was dealt in.
    pub round: u32,
    /// Set once the owner plays the card (or it auto-settles at round end).
    pub played: bool,
    /// Stock chosen by the owner at play time; `None` until played.
    pub symbol: Option<Symbol>,
}

impl CorporateAction {
    /// Is this an active rights issue (subscription window open)?
    #[must_use]
    pub fn is_active_rights(&self) -> bool {
        matches!(
            self.kind,
            CorporateActionKind::RightsIssue {
                status: RightsStatus::Active,
                ..
            }
        )
    }
}
