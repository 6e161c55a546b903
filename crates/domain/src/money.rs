//! Monetary rounding.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places kept on every computed amount.
pub const MONEY_SCALE: u32 = 2;

/// Rounds an amount to two decimal places, midpoints away from zero.
///
/// `10.125` becomes `10.13` and `-1.235` becomes `-1.24`.
pub fn round2(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}
