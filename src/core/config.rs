//! Game configuration.
//!
//! Everything the two historical rule sets disagreed on (hand size,
//! corporate-card mix, severity thresholds, rights-issue terms) is an
//! explicit knob here with a documented default, so hosts override values
//! rather than fork rules.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::{EngineError, EngineResult};
use super::ids::Symbol;

/// Initial listing for one stock.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StockSpec {
    /// Ticker symbol (unique within a game).
    pub symbol: Symbol,
    /// Opening price.
    pub price: Decimal,
    /// Total issued quantity; the hard cap for bonus issues.
    pub total_quantity: u64,
}

impl StockSpec {
    /// Create a listing spec.
    pub fn new(symbol: impl Into<Symbol>, price: Decimal, total_quantity: u64) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            total_quantity,
        }
    }
}

/// Complete rule configuration for a game.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameConfig {
    /// Full player rotations per round.
    pub turns_per_round: u32,
    /// Rounds until the game completes.
    pub max_rounds: u32,
    /// Cards dealt to each player per round.
    pub hand_size: usize,
    /// Fraction of the hand that is corporate-action cards (percent).
    /// At least one corporate card is always dealt.
    pub corporate_fraction_pct: Decimal,
    /// Starting cash per player.
    pub starting_cash: Decimal,
    /// Stock listings.
    pub stocks: Vec<StockSpec>,

    /// Ownership percent required for chairman.
    pub chairman_pct: Decimal,
    /// Ownership percent required for director.
    pub director_pct: Decimal,

    /// Dividend payout as percent of price per share.
    pub dividend_pct: Decimal,
    /// Rights issue: entitlement base ("1-for-2" => base 2).
    pub rights_base_shares: u64,
    /// Rights issue: shares granted per base ("1-for-2" => ratio 1).
    pub rights_ratio: u64,
    /// Rights issue: subscription price as percent of market price.
    pub rights_price_pct: Decimal,
    /// Bonus issue: entitlement base ("1-for-5" => base 5).
    pub bonus_base_shares: u64,
    /// Bonus issue: shares granted per base.
    pub bonus_ratio: u64,

    /// First round in which crash/bull-run overrides can occur.
    pub rare_event_min_round: u32,
    /// Per-draw probability of a crash, and independently of a bull run.
    pub rare_event_chance: f64,
    /// Crash price delta.
    pub crash_impact: Decimal,
    /// Bull-run price delta.
    pub bull_run_impact: Decimal,

    /// Inflation card: percent applied to every player's cash (negative).
    pub inflation_pct: Decimal,
    /// Deflation card: percent applied to every player's cash (positive).
    pub deflation_pct: Decimal,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            turns_per_round: 3,
            max_rounds: 10,
            hand_size: 10,
            corporate_fraction_pct: Decimal::from(10),
            starting_cash: Decimal::from(10_000),
            stocks: vec![
                StockSpec::new("TECH", Decimal::from(100), 1_000),
                StockSpec::new("BANK", Decimal::from(150), 1_000),
                StockSpec::new("AUTO", Decimal::from(80), 1_000),
                StockSpec::new("ENRG", Decimal::from(120), 1_000),
            ],
            chairman_pct: Decimal::from(50),
            director_pct: Decimal::from(25),
            dividend_pct: Decimal::from(5),
            rights_base_shares: 2,
            rights_ratio: 1,
            rights_price_pct: Decimal::from(50),
            bonus_base_shares: 5,
            bonus_ratio: 1,
            rare_event_min_round: 3,
            rare_event_chance: 0.05,
            crash_impact: Decimal::from(-35),
            bull_run_impact: Decimal::from(35),
            inflation_pct: Decimal::from(-10),
            deflation_pct: Decimal::from(10),
        }
    }
}

impl GameConfig {
    /// Create the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the round structure.
    #[must_use]
    pub fn with_rounds(mut self, max_rounds: u32, turns_per_round: u32) -> Self {
        self.max_rounds = max_rounds;
        self.turns_per_round = turns_per_round;
        self
    }

    /// Override the per-round hand size.
    #[must_use]
    pub fn with_hand_size(mut self, hand_size: usize) -> Self {
        self.hand_size = hand_size;
        self
    }

    /// Override starting cash.
    #[must_use]
    pub fn with_starting_cash(mut self, cash: Decimal) -> Self {
        self.starting_cash = cash;
        self
    }

    /// Replace the stock listings.
    #[must_use]
    pub fn with_stocks(mut self, stocks: Vec<StockSpec>) -> Self {
        self.stocks = stocks;
        self
    }

    /// Number of corporate-action cards per hand (always at least one).
    #[must_use]
    pub fn corporate_cards_per_hand(&self) -> usize {
        let exact = Decimal::from(self.hand_size as u64) * self.corporate_fraction_pct
            / Decimal::from(100);
        let rounded = exact.round().to_usize().unwrap_or(0);
        rounded.max(1).min(self.hand_size)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> EngineResult<()> {
        if self.turns_per_round == 0 || self.max_rounds == 0 {
            return Err(EngineError::validation(
                "turns_per_round and max_rounds must be positive",
            ));
        }
        if self.hand_size == 0 {
            return Err(EngineError::validation("hand_size must be positive"));
        }
        if self.stocks.is_empty() {
            return Err(EngineError::validation("at least one stock is required"));
        }
        let mut symbols: Vec<_> = self.stocks.iter().map(|s| &s.symbol).collect();
        symbols.sort();
        symbols.dedup();
        if symbols.len() != self.stocks.len() {
            return Err(EngineError::validation("duplicate stock symbols"));
        }
        for spec in &self.stocks {
            if spec.price < Decimal::ZERO || spec.total_quantity == 0 {
                return Err(EngineError::validation(format!(
                    "stock {} must have non-negative price and positive quantity",
                    spec.symbol
                )));
            }
        }
        if self.rights_base_shares == 0 || self.bonus_base_shares == 0 {
            return Err(EngineError::validation(
                "rights and bonus entitlement bases must be positive",
            ));
        }
        if !(0.0..=1.0).contains(&self.rare_event_chance) {
            return Err(EngineError::validation(
                "rare_event_chance must be within [0, 1]",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn test_corporate_cards_per_hand() {
        let config = GameConfig::default();
        // 10% of 10 cards = 1
        assert_eq!(config.corporate_cards_per_hand(), 1);

        // Small hands still get one corporate card
        let small = GameConfig::default().with_hand_size(4);
        assert_eq!(small.corporate_cards_per_hand(), 1);

        let large = GameConfig::default().with_hand_size(25);
        assert_eq!(large.corporate_cards_per_hand(), 3);
    }

    #[test]
    fn test_duplicate_symbols_rejected() {
        let config = GameConfig::default().with_stocks(vec![
            StockSpec::new("TECH", Decimal::from(100), 1_000),
            StockSpec::new("tech", Decimal::from(50), 500),
        ]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_rounds_rejected() {
        let config = GameConfig::default().with_rounds(0, 3);
        assert!(config.validate().is_err());
    }
}
