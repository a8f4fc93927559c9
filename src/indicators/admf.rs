// =============================================================================
// ADMF — Accumulation/Distribution Money Flow
// =============================================================================
//
// A volume-and-direction-weighted oscillator: positive values indicate net
// accumulation pressure, negative values net distribution pressure, with
// magnitude scaled by traded value.
//
// Per bar:
//   ad_ratio = (close - prevClose) / TR     (0 when TR is 0 or undefined)
//   flow     = volume * hlc3 * ad_ratio
//   ADMF     = RMA(flow, length)            (Wilder smoothing, default 14)
//
// The ratio normalizes the directional move by that bar's own volatility
// range, bounding it to [-1, 1] for non-gapping bars; the zero fallback for a
// zero True Range (a flat bar with no gap has no directional information) is
// part of the formula, not an error path.
// =============================================================================

use crate::indicators::rma::rma;
use crate::types::Bar;

/// The two money-flow columns derived from one instrument's bars.
///
/// Both columns are total: the zero fallback defines `ad_ratio` on every bar
/// (including bar 0, which has no prior close), and the RMA is defined from
/// its first sample. Each has exactly one entry per input bar.
#[derive(Debug, Clone)]
pub struct MoneyFlow {
    /// Close-to-close change normalized by True Range, in [-1, 1] for
    /// non-gapping bars.
    pub ad_ratio: Vec<f64>,
    /// Wilder-smoothed weighted flow — the oscillator itself.
    pub admf: Vec<f64>,
}

/// Compute the ADMF oscillator and its intermediate direction ratio.
///
/// `tr` must be the True Range column for the same `bars` (same length).
///
/// # Edge cases
/// - empty `bars` => both columns empty
/// - `length == 0` => both columns empty (smoothing undefined; callers treat
///   a zero length as a configuration error)
pub fn money_flow(bars: &[Bar], tr: &[Option<f64>], length: usize) -> MoneyFlow {
    debug_assert_eq!(bars.len(), tr.len());

    if bars.is_empty() || length == 0 {
        return MoneyFlow {
            ad_ratio: Vec::new(),
            admf: Vec::new(),
        };
    }

    let mut ad_ratio = Vec::with_capacity(bars.len());
    let mut flow = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        let ratio = if i == 0 {
            // No prior close: the change is undefined, the ratio falls to 0.
            0.0
        } else {
            match tr[i] {
                Some(range) if range != 0.0 => (bar.close - bars[i - 1].close) / range,
                _ => 0.0,
            }
        };

        ad_ratio.push(ratio);
        flow.push(bar.volume as f64 * bar.hlc3() * ratio);
    }

    let admf = rma(&flow, length);

    MoneyFlow { ad_ratio, admf }
}
