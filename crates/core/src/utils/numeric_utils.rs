//! Tolerance-based monetary comparisons.
//!
//! Amounts are IEEE doubles; raw `== 0.0` is never what a ledger wants.
//! Every near-zero decision in the engine funnels through these helpers so
//! the threshold lives in exactly one place (`constants::TOLERANCE`).

use crate::constants::TOLERANCE;

/// Whether an amount is zero for accounting purposes.
pub fn is_zero(value: f64) -> bool {
    value.abs() < TOLERANCE
}

/// Whether an amount is not meaningfully negative.
pub fn is_non_negative(value: f64) -> bool {
    value > -TOLERANCE
}

/// Whether an amount is not meaningfully positive.
pub fn is_non_positive(value: f64) -> bool {
    value < TOLERANCE
}

/// Whether two amounts are equal within tolerance.
pub fn is_equal(a: f64, b: f64) -> bool {
    is_zero(a - b)
}
