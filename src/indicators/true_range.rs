// =============================================================================
// True Range — per-bar volatility column
// =============================================================================
//
// True Range for each bar:
//   TR = max(H - L, |H - prevClose|, |L - prevClose|)
//
// It captures both the intrabar range and any overnight gap from the prior
// close.  The first bar has no prior close, so TR[0] is absent — not zero.
// A zero TR is itself legal (a flat bar with no gap) and the money-flow
// ratio downstream must map it to 0, not to a division error.
// =============================================================================

use crate::types::Bar;

/// Compute the True Range column for `bars`, one entry per bar.
///
/// `None` only at index 0 (no prior close to gap against).
pub fn true_range(bars: &[Bar]) -> Vec<Option<f64>> {
    let mut result = Vec::with_capacity(bars.len());

    if bars.is_empty() {
        return result;
    }
    result.push(None);

    for pair in bars.windows(2) {
        let prev_close = pair[0].close;
        let bar = &pair[1];

        let hl = bar.high - bar.low;
        let hc = (bar.high - prev_close).abs();
        let lc = (bar.low - prev_close).abs();

        result.push(Some(hl.max(hc).max(lc)));
    }

    result
}
