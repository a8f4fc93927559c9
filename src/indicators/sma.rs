// =============================================================================
// Simple Moving Average — rolling mean column
// =============================================================================
//
// The arithmetic mean of the trailing `window` values.  Position `i` is
// defined only once `window` values exist (`i >= window - 1`); earlier
// positions are `None`.  The same transform is applied to closing prices
// (ma5 / ma20 / ma60) and to traded volume (va5 / va20 / va60).
// =============================================================================

/// Compute the rolling mean of `values` over `window`, one entry per input.
///
/// A running sum keeps the pass O(n) regardless of window size.
///
/// # Edge cases
/// - `window == 0` => all `None` (a zero-length mean is meaningless)
/// - `values.len() < window` => all `None`
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    let window_f = window as f64;
    let mut result = Vec::with_capacity(values.len());
    let mut running_sum = 0.0_f64;

    for (i, &x) in values.iter().enumerate() {
        running_sum += x;
        if i >= window {
            running_sum -= values[i - window];
        }

        if i + 1 >= window {
            result.push(Some(running_sum / window_f));
        } else {
            result.push(None);
        }
    }

    result
}
