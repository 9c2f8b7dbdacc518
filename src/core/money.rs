//! Money math helpers.
//!
//! All monetary values (cash, prices, average costs) are `Decimal` and every
//! stored amount is rounded to cents. Percentages are expressed as whole
//! percent values (e.g. `10` means 10%), matching how card impacts are
//! written on the cards themselves.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round a monetary amount to cents.
#[must_use]
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a display percentage to two decimals.
#[must_use]
pub fn round_pct(pct: Decimal) -> Decimal {
    pct.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `amount × pct / 100`, rounded to cents.
#[must_use]
pub fn percent_of(amount: Decimal, pct: Decimal) -> Decimal {
    round_cents(amount * pct / Decimal::from(100))
}

/// A decimal from whole units (convenience for literals in tests/config).
#[must_use]
pub fn dec(units: i64) -> Decimal {
    Decimal::from(units)
}

/// A decimal from cents, e.g. `cents(10650)` is 106.50.
#[must_use]
pub fn cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}
