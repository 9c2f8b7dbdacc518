//! Price-impact engine.
//!
//! Pure numeric functions, no state. Impacts are absolute price deltas (a
//! `-4` card moves the price down four dollars); cash impacts are percent of
//! current cash. All results round to cents.
//!
//! Display percentages for a round's events are computed against the price
//! *before any* of that round's impacts applied, so every event of a round
//! reports a comparable figure.

use rust_decimal::Decimal;

use crate::core::error::{EngineError, EngineResult};
use crate::core::money::{round_cents, round_pct};

/// Apply one price delta, clamped at `floor` and rounded to cents.
pub fn apply_impact(price: Decimal, delta: Decimal, floor: Decimal) -> EngineResult<Decimal> {
    if price < floor {
        return Err(EngineError::internal(format!(
            "price {price} below floor {floor} before impact"
        )));
    }
    let moved = price + delta;
    Ok(round_cents(moved.max(floor)))
}

/// Apply many deltas at once: sum first, clamp and round once.
pub fn apply_impacts(price: Decimal, deltas: &[Decimal], floor: Decimal) -> EngineResult<Decimal> {
    let total: Decimal = deltas.iter().copied().sum();
    apply_impact(price, total, floor)
}

/// Display percentage for one delta against the pre-round price, rounded to
/// two decimals. A zero pre-round price reports 0%.
#[must_use]
pub fn percent_change(delta: Decimal, pre_round_price: Decimal) -> Decimal {
    if pre_round_price.is_zero() {
        return Decimal::ZERO;
    }
    round_pct(delta / pre_round_price * Decimal::from(100))
}

/// Apply the round's *net* cash impact (percent) to a cash balance, floored
/// at zero. Positive percent is deflation (purchasing-power gain), negative
/// is inflation.
#[must_use]
pub fn apply_cash_impact(cash: Decimal, net_pct: Decimal) -> Decimal {
    let adjusted = cash + cash * net_pct / Decimal::from(100);
    round_cents(adjusted.max(Decimal::ZERO))
}
