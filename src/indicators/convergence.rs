// =============================================================================
// Moving-Average Convergence — percentage spread metrics
// =============================================================================
//
// Pairwise spread between two averages a and b, as a percentage of their
// midpoint:
//
//   pct_diff(a, b) = |a - b| / ((a + b) / 2) * 100     (0 when the midpoint is 0)
//
// Applied to the three price-MA pairs (ma5, ma20), (ma20, ma60), (ma5, ma60);
// the aggregate is the arithmetic mean of the three spreads.  The identical
// aggregate over (va5, va20, va60) yields the volume-side figure.
//
// Near-zero output means the averages have converged (the consolidation
// signal the scanner surfaces); larger values mean wider dispersion.
//
// Averages still inside their warm-up window enter this module as 0.  The
// exported daily table keeps the same positions null; downstream consumers
// depend on that asymmetry, so it is kept as-is.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::indicators::round_dp;

/// Percentage spread between `a` and `b` relative to their midpoint.
///
/// Returns 0 when both are 0, or when the midpoint is 0 (equal and opposite
/// inputs cannot occur for real averages, but the guard keeps the function
/// total).
pub fn pct_diff(a: f64, b: f64) -> f64 {
    if a == 0.0 && b == 0.0 {
        return 0.0;
    }
    let midpoint = (a + b) / 2.0;
    if midpoint == 0.0 {
        return 0.0;
    }
    (a - b).abs() / midpoint * 100.0
}

/// Mean pairwise spread across a short/mid/long average triple.
pub fn aggregate_spread(short: f64, mid: f64, long: f64) -> f64 {
    (pct_diff(short, mid) + pct_diff(mid, long) + pct_diff(short, long)) / 3.0
}

/// The three pairwise price-MA spreads plus their mean, wire-rounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceMetrics {
    pub ma5_20: f64,
    pub ma20_60: f64,
    pub ma5_60: f64,
    #[serde(rename = "maConverge")]
    pub ma_converge: f64,
}

impl ConvergenceMetrics {
    /// Build the metrics from the latest ma5/ma20/ma60 values, rounding each
    /// figure to 2 decimals for the wire.
    pub fn from_averages(ma5: f64, ma20: f64, ma60: f64) -> Self {
        Self {
            ma5_20: round_dp(pct_diff(ma5, ma20), 2),
            ma20_60: round_dp(pct_diff(ma20, ma60), 2),
            ma5_60: round_dp(pct_diff(ma5, ma60), 2),
            ma_converge: round_dp(aggregate_spread(ma5, ma20, ma60), 2),
        }
    }
}
