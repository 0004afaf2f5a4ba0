//! Module containing miscellaneous utility functions.

use crate::imports::*;

/// Backward first difference with a leading zero, so the result has the same length
/// as `x`. Not scaled by a time step.
pub fn diff(x: &Array1<f64>) -> Array1<f64> {
    let mut out = Array1::zeros(x.len());
    for i in 1..x.len() {
        out[i] = x[i] - x[i - 1];
    }
    out
}

/// return max <f64> of arr, `None` if arr is empty
pub fn arrmax(arr: &[f64]) -> Option<f64> {
    arr.iter().copied().reduce(f64::max)
}

/// Number of elements whose magnitude strictly exceeds `threshold`
pub fn count_abs_above(arr: &Array1<f64>, threshold: f64) -> usize {
    arr.iter().filter(|x| x.abs() > threshold).count()
}

/// Formats a score in [0, 1] as a whole percentage, e.g. `0.88` -> `"88%"`.
/// The score is first rounded to two decimals from its exact binary value, then the
/// percentage is truncated, so `0.615` (stored just below the tie) reads `"61%"`.
pub fn score_percentage(score: f64) -> String {
    let rounded: f64 = format!("{score:.2}").parse().unwrap_or(score);
    format!("{}%", (rounded * 100.0) as i64)
}
