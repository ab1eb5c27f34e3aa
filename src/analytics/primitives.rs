//! Stateless numeric primitives used by the conditional aggregations.
//!
//! These are pure functions over slices of `f64`. NaN entries are treated as
//! missing and skipped; an empty (or all-NaN) input yields `None` rather
//! than a number.

use statrs::distribution::{ContinuousCDF, StudentsT};

fn valid(values: &[f64]) -> impl Iterator<Item = f64> + '_ {
    values.iter().copied().filter(|v| !v.is_nan())
}

/// Arithmetic mean of the available (non-NaN) values.
pub fn mean(values: &[f64]) -> Option<f64> {
    let (sum, count) = valid(values).fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        return None;
    }
    Some(sum / count as f64)
}

/// Sample standard deviation (n - 1 denominator) of available values.
///
/// Requires at least two values.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    let valid_values: Vec<f64> = valid(values).collect();
    if valid_values.len() < 2 {
        return None;
    }

    let n = valid_values.len() as f64;
    let mean = valid_values.iter().sum::<f64>() / n;
    let sum_squared_diff: f64 = valid_values
        .iter()
        .map(|&value| (value - mean).powi(2))
        .sum();

    Some((sum_squared_diff / (n - 1.0)).sqrt())
}

/// Pearson correlation coefficient of two equally long series.
///
/// Returns `None` when the lengths differ, fewer than two pairs exist, or
/// either series has zero variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }

    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (&x, &y) in xs.iter().zip(ys.iter()) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return None;
    }

    let r = sxy / (sxx * syy).sqrt();
    if r.is_nan() {
        return None;
    }
    Some(r.clamp(-1.0, 1.0))
}

/// Two-sided p-value of a Pearson coefficient under the null of no
/// correlation, using a Student t distribution with `n - 2` degrees of
/// freedom.
///
/// Undefined for fewer than three pairs.
pub fn correlation_p_value(r: f64, n: usize) -> Option<f64> {
    if n < 3 || r.is_nan() {
        return None;
    }
    if r.abs() >= 1.0 {
        return Some(0.0);
    }

    let df = (n - 2) as f64;
    let t = r * (df / (1.0 - r * r)).sqrt();
    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    Some((2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0))
}

/// Divides `numerator` by `denominator` unless the denominator magnitude is
/// below `min_denominator`.
pub fn guarded_ratio(numerator: f64, denominator: f64, min_denominator: f64) -> Option<f64> {
    if numerator.is_nan() || denominator.is_nan() || denominator.abs() < min_denominator {
        return None;
    }

    let ratio = numerator / denominator;
    if ratio.is_finite() {
        Some(ratio)
    } else {
        None
    }
}
