// =============================================================================
// RMA — Wilder's Smoothing (Relative Moving Average)
// =============================================================================
//
// Recursive exponential smoothing with decay alpha = 1 / length, seeded by
// the first sample:
//
//   y[0] = x[0]
//   y[i] = y[i-1] + (x[i] - y[i-1]) / length
//
// There is no warm-up window: the value is defined from the very first
// sample.  Early values simply carry more weight from the seed; they become
// representative after roughly `length` samples.  Every smoothed indicator in
// this crate that takes a "period" (the 14-day ADMF in particular) uses this
// one law.
// =============================================================================

/// Compute the RMA series for `values` with the given smoothing `length`.
///
/// The output has exactly one entry per input — early entries are computed,
/// never nulled.
///
/// # Edge cases
/// - `length == 0` => empty vec (division by zero guard)
/// - empty input => empty vec
pub fn rma(values: &[f64], length: usize) -> Vec<f64> {
    if length == 0 || values.is_empty() {
        return Vec::new();
    }

    let length_f = length as f64;
    let mut result = Vec::with_capacity(values.len());

    let mut prev = values[0];
    result.push(prev);

    for &x in &values[1..] {
        prev += (x - prev) / length_f;
        result.push(prev);
    }

    result
}
