// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicator battery applied to
// every instrument's daily series.  Columnar functions return one entry per
// input bar, with `None` marking positions where a value is not yet
// computable — a missing value is a valid domain outcome here, never an
// error, and is never replaced by a fabricated number.

pub mod admf;
pub mod convergence;
pub mod oscillation;
pub mod rma;
pub mod sma;
pub mod true_range;

/// Round `value` to `decimals` fractional digits.
///
/// Output records carry wire-rounded numbers; everything upstream of record
/// assembly stays full precision.
pub(crate) fn round_dp(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
