//! Stocks, holdings, and price history.

use im::Vector;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::money::round_cents;
use crate::core::{PlayerId, Symbol};

/// One stock listing.
///
/// Conservation invariant: across the game,
/// `sum of all holdings + available == total`. Trades and corporate actions
/// move shares between `available` and player holdings; nothing else does.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    /// Ticker symbol, the unique key.
    pub symbol: Symbol,
    /// Current market price (>= 0).
    pub price: Decimal,
    /// Shares not held by any player.
    pub available: u64,
    /// Total issued quantity; hard cap for bonus issues.
    pub total: u64,
    /// Current chairman, if any player holds the chairman threshold.
    pub chairman: Option<PlayerId>,
    /// Current director, if any (never the chairman).
    pub director: Option<PlayerId>,
    /// One point per settled round, in round order.
    pub history: Vector<PricePoint>,
}

impl Stock {
    /// Create a freshly listed stock with all shares available.
    pub fn new(symbol: Symbol, price: Decimal, total: u64) -> Self {
        Self {
            symbol,
            price,
            available: total,
            total,
            chairman: None,
            director: None,
            history: Vector::new(),
        }
    }

    /// Shares currently held by players.
    #[must_use]
    pub fn issued_to_players(&self) -> u64 {
        self.total - self.available
    }

    /// Append a price-history point for a settled round.
    pub fn record_history(&mut self, round: u32) {
        self.history.push_back(PricePoint {
            round,
            price: self.price,
        });
    }

    /// The recorded price for a given round, if that round has settled.
    #[must_use]
    pub fn price_at_round(&self, round: u32) -> Option<Decimal> {
        self.history.iter().find(|p| p.round == round).map(|p| p.price)
    }
}

/// Price recorded at a round settlement.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// The round this price closed.
    pub round: u32,
    /// Closing price.
    pub price: Decimal,
}

/// A player's position in one stock.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// Shares held (>= 0).
    pub quantity: u64,
    /// Volume-weighted average cost per share.
    pub avg_cost: Decimal,
}

impl Holding {
    /// Add shares bought at `price_per_share`, recomputing the
    /// volume-weighted average cost.
    pub fn add_shares(&mut self, quantity: u64, price_per_share: Decimal) {
        if quantity == 0 {
            return;
        }
        let old_qty = Decimal::from(self.quantity);
        let new_qty = Decimal::from(self.quantity + quantity);
        let cost = self.avg_cost * old_qty + price_per_share * Decimal::from(quantity);
        self.avg_cost = round_cents(cost / new_qty);
        self.quantity += quantity;
    }

    /// Add bonus shares at zero cost: the cost basis is unchanged, spread
    /// over more shares.
    pub fn add_bonus_shares(&mut self, quantity: u64) {
        if quantity == 0 {
            return;
        }
        let old_qty = Decimal::from(self.quantity);
        let new_qty = Decimal::from(self.quantity + quantity);
        self.avg_cost = round_cents(self.avg_cost * old_qty / new_qty);
        self.quantity += quantity;
    }

    /// Remove sold shares. Average cost is unchanged by a sale.
    ///
    /// Panics if `quantity` exceeds the holding; callers validate first.
    pub fn remove_shares(&mut self, quantity: u64) {
        assert!(quantity <= self.quantity, "sell exceeds holding");
        self.quantity -= quantity;
        if self.quantity == 0 {
            self.avg_cost = Decimal::ZERO;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::money::{cents, dec};

    #[test]
    fn test_new_stock_fully_available() {
        let stock = Stock::new(Symbol::new("TECH"), dec(100), 1_000);
        assert_eq!(stock.available, 1_000);
        assert_eq!(stock.issued_to_players(), 0);
        assert!(stock.chairman.is_none());
    }

    #[test]
    fn test_vwap_on_buys() {
        let mut holding = Holding::default();
        holding.add_shares(10, dec(100));
        assert_eq!(holding.avg_cost, dec(100));

        // 10 @ 100 + 10 @ 120 => avg 110
        holding.add_shares(10, dec(120));
        assert_eq!(holding.quantity, 20);
        assert_eq!(holding.avg_cost, dec(110));
    }

    #[test]
    fn test_bonus_shares_spread_cost_basis() {
        let mut holding = Holding::default();
        holding.add_shares(12, dec(70));

        holding.add_bonus_shares(2);
        assert_eq!(holding.quantity, 14);
        // 70 * 12 / 14 = 60.00
        assert_eq!(holding.avg_cost, dec(60));
    }

    #[test]
    fn test_sale_keeps_avg_cost_until_flat() {
        let mut holding = Holding::default();
        holding.add_shares(10, cents(10050));

        holding.remove_shares(4);
        assert_eq!(holding.quantity, 6);
        assert_eq!(holding.avg_cost, cents(10050));

        holding.remove_shares(6);
        assert_eq!(holding.avg_cost, Decimal::ZERO);
    }

    #[test]
    fn test_history_lookup() {
        let mut stock = Stock::new(Symbol::new("BANK"), dec(150), 500);
        stock.record_history(1);
        stock.price = dec(160);
        stock.record_history(2);

        assert_eq!(stock.price_at_round(1), Some(dec(150)));
        assert_eq!(stock.price_at_round(2), Some(dec(160)));
        assert_eq!(stock.price_at_round(3), None);
    }
}
