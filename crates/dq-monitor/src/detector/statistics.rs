//! Numeric statistics over the present values of a column.

use crate::utils::quantile_sorted;

/// Multiplier applied to the IQR to build the outlier fences.
pub const IQR_MULTIPLIER: f64 = 1.5;

/// IQR fences `[Q1 - 1.5 * IQR, Q3 + 1.5 * IQR]`, or `None` without values.
pub(crate) fn iqr_bounds(values: &[f64]) -> Option<(f64, f64)> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let q1 = quantile_sorted(&sorted, 0.25)?;
    let q3 = quantile_sorted(&sorted, 0.75)?;
    let iqr = q3 - q1;

    Some((q1 - IQR_MULTIPLIER * iqr, q3 + IQR_MULTIPLIER * iqr))
}

/// Count values outside the IQR fences. Zero for an empty column.
pub(crate) fn count_outliers(values: &[f64]) -> usize {
    let Some((lower_bound, upper_bound)) = iqr_bounds(values) else {
        return 0;
    };

    values
        .iter()
        .filter(|&&val| val < lower_bound || val > upper_bound)
        .count()
}

/// Adjusted Fisher-Pearson sample skewness (G1).
///
/// `G1 = sqrt(n(n-1)) / (n-2) * m3 / m2^1.5` with biased central moments
/// `m2`, `m3`. Returns 0.0 when undefined: fewer than three values or a
/// constant column.
pub(crate) fn calculate_skewness(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 3 || values.iter().all(|&v| v == values[0]) {
        return 0.0;
    }

    let n_f = n as f64;
    let mean = values.iter().sum::<f64>() / n_f;

    let (m2, m3) = values.iter().fold((0.0, 0.0), |(m2, m3), &v| {
        let d = v - mean;
        (m2 + d * d, m3 + d * d * d)
    });
    let m2 = m2 / n_f;
    let m3 = m3 / n_f;

    // Rounding noise on a constant column must not turn into a huge skew.
    // The tolerance is squared so it is on the same scale as the variance.
    let max_abs = values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if m2 <= (f64::EPSILON * max_abs).powi(2) {
        return 0.0;
    }

    let g1 = m3 / m2.powf(1.5);
    ((n_f * (n_f - 1.0)).sqrt() / (n_f - 2.0)) * g1
}
