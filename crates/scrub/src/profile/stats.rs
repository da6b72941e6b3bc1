//! Descriptive statistics over finite samples.
//!
//! Every function returns `None` for an empty sample.

use std::cmp::Ordering;

/// Arithmetic mean.
///
/// Samples whose sum overflows are rescaled by their largest magnitude, so
/// the result stays finite.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let sum = values.iter().sum::<f64>();
    if sum.is_finite() {
        return Some(sum / n);
    }
    let scale = max_abs(values);
    if scale == 0.0 || !scale.is_finite() {
        return Some(sum / n);
    }
    Some(values.iter().map(|v| v / scale).sum::<f64>() / n * scale)
}

/// Population standard deviation, rescaled like [`mean`] on overflow.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    let n = values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    if variance.is_finite() {
        return Some(variance.sqrt());
    }
    let scale = max_abs(values);
    if scale == 0.0 || !scale.is_finite() {
        return Some(variance.sqrt());
    }
    let scaled_mean = mean / scale;
    let variance = values
        .iter()
        .map(|v| (v / scale - scaled_mean).powi(2))
        .sum::<f64>()
        / n;
    Some(variance.sqrt() * scale)
}

fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0_f64, |m, v| m.max(v.abs()))
}

/// Median (linear-interpolation quantile at 0.5).
pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// Quantile using linear interpolation between closest ranks.
///
/// `p` is clamped to `[0, 1]`.
pub fn quantile(values: &[f64], p: f64) -> Option<f64> {
    let sorted = sorted(values);
    quantile_sorted(&sorted, p)
}

/// [`quantile`] over an already ascending sample.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let position = p.clamp(0.0, 1.0) * last as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Copy of the sample in ascending order.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sorted
}

/// Standard score; zero when the spread is zero.
pub fn z_score(value: f64, mean: f64, std_dev: f64) -> f64 {
    if std_dev == 0.0 {
        0.0
    } else {
        (value - mean) / std_dev
    }
}
