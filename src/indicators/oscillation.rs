// =============================================================================
// Oscillation Statistics — trailing-window summary of the ADMF oscillator
// =============================================================================
//
// Normalizes the trailing `period_days` oscillator values by the window's own
// peak magnitude and summarizes how the oscillator has behaved over that
// horizon:
//
//   zero_cross_count — adjacent sign changes (how often pressure flipped)
//   avg_distance     — mean |normalized| * 100, in [0, 100]
//   max_distance     — max |normalized| * 100 (always 100 by construction)
//   pct_near_zero    — share of values within `near_zero_threshold` of the
//                      peak magnitude, * 100; high values flag an instrument
//                      hugging neutral (sideways / consolidating)
//
// The result is absent — not zero, not an error — when the window holds fewer
// than half of `period_days` values or the oscillator is flat (a zero peak
// gives no normalization base).  New listings and halted names land here.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::indicators::round_dp;

/// Summary of one oscillator window.  Produced per lookback horizon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OscillationStats {
    pub zero_cross_count: u32,
    pub avg_distance: f64,
    pub max_distance: f64,
    pub pct_near_zero: f64,
}

/// Sign class with zero as its own class, so a value sitting exactly on the
/// axis still separates a negative-to-positive alternation into two counted
/// transitions.
fn sign_class(x: f64) -> i8 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

/// Summarize the trailing `period_days` entries of the oscillator column.
///
/// The horizons are evaluated against the same column sliced differently; the
/// column itself is total (the ratio fallback and the smoothing law define a
/// value on every bar), so a short window only occurs when the series itself
/// is shorter than the horizon.
///
/// Returns `None` when:
/// - `period_days` is zero,
/// - fewer than half of `period_days` values exist,
/// - the window's peak magnitude is zero (flat oscillator).
pub fn oscillation_stats(
    admf: &[f64],
    period_days: usize,
    near_zero_threshold: f64,
) -> Option<OscillationStats> {
    if period_days == 0 {
        return None;
    }

    let window = &admf[admf.len().saturating_sub(period_days)..];
    if window.len() * 2 < period_days {
        return None;
    }

    let max_abs = window.iter().fold(0.0_f64, |m, x| m.max(x.abs()));
    if max_abs == 0.0 {
        return None;
    }

    // Sign changes are counted on the raw values; normalization by a positive
    // constant cannot move a value across zero, so either view gives the same
    // count.
    let zero_cross_count = window
        .windows(2)
        .filter(|pair| sign_class(pair[0]) != sign_class(pair[1]))
        .count() as u32;

    let len_f = window.len() as f64;
    let abs_norm_sum: f64 = window.iter().map(|x| x.abs() / max_abs).sum();
    // The peak divided by itself is exactly 1, so max_distance is always 100.
    let max_norm = window
        .iter()
        .map(|x| x.abs() / max_abs)
        .fold(0.0_f64, f64::max);
    let near_zero = window
        .iter()
        .filter(|x| x.abs() / max_abs < near_zero_threshold)
        .count();

    Some(OscillationStats {
        zero_cross_count,
        avg_distance: round_dp(abs_norm_sum / len_f * 100.0, 2),
        max_distance: round_dp(max_norm * 100.0, 2),
        pct_near_zero: round_dp(near_zero as f64 / len_f * 100.0, 1),
    })
}
