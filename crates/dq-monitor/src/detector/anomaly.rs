use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::statistics::{calculate_skewness, count_outliers};
use crate::types::AnomalyReport;
use crate::utils::{distinct_count, is_numeric_dtype, missing_count, numeric_values, round_to};

/// Columns with fewer distinct values than this are reported as low cardinality.
pub const LOW_CARDINALITY_THRESHOLD: usize = 5;

/// Decimal places kept for skewness values.
pub const SKEWNESS_DECIMALS: i32 = 2;

/// Run every data-quality check over `df` and collect the results.
///
/// Pure and total: the same frame always yields the same report, and the
/// empty frame yields zero counts and empty maps. A polars failure inside a
/// single check is logged and that check falls back to its empty value.
pub fn detect(df: &DataFrame) -> AnomalyReport {
    debug!("Running anomaly detection on frame of shape {:?}", df.shape());

    let distinct = distinct_counts(df);

    let report = AnomalyReport {
        missing_values: or_empty("missing_values", missing_values(df)),
        duplicate_rows: or_empty("duplicate_rows", duplicate_rows(df)),
        zero_variance_columns: zero_variance_columns(&distinct),
        outliers: or_empty("outliers", outliers(df)),
        skewness: or_empty("skewness", skewness(df)),
        low_cardinality: low_cardinality(&distinct),
        row_count: df.height(),
        column_count: df.width(),
    };

    debug!(
        "Detection complete: {} duplicate rows, {} zero-variance columns, {} outliers",
        report.duplicate_rows,
        report.zero_variance_columns.len(),
        report.total_outliers()
    );

    report
}

fn or_empty<T: Default>(check: &str, result: PolarsResult<T>) -> T {
    result.unwrap_or_else(|e| {
        warn!("Anomaly check '{}' failed, reporting empty result: {}", check, e);
        T::default()
    })
}

fn missing_values(df: &DataFrame) -> PolarsResult<BTreeMap<String, usize>> {
    df.get_columns()
        .iter()
        .map(|col| {
            let count = missing_count(col.as_materialized_series())?;
            Ok((col.name().to_string(), count))
        })
        .collect()
}

/// Rows that repeat an earlier row; the first occurrence is not counted.
fn duplicate_rows(df: &DataFrame) -> PolarsResult<usize> {
    if df.width() == 0 || df.height() == 0 {
        return Ok(0);
    }
    let unique = df.unique::<&str, &str>(None, UniqueKeepStrategy::First, None)?;
    Ok(df.height() - unique.height())
}

/// Distinct non-missing counts per column, in column order.
///
/// A column whose count cannot be computed is left out of both the
/// zero-variance and the low-cardinality results.
fn distinct_counts(df: &DataFrame) -> Vec<(String, usize)> {
    df.get_columns()
        .iter()
        .filter_map(|col| match distinct_count(col.as_materialized_series()) {
            Ok(count) => Some((col.name().to_string(), count)),
            Err(e) => {
                warn!("Could not count distinct values of '{}': {}", col.name(), e);
                None
            }
        })
        .collect()
}

fn zero_variance_columns(distinct: &[(String, usize)]) -> Vec<String> {
    distinct
        .iter()
        .filter(|(_, count)| *count <= 1)
        .map(|(name, _)| name.clone())
        .collect()
}

fn low_cardinality(distinct: &[(String, usize)]) -> BTreeMap<String, usize> {
    distinct
        .iter()
        .filter(|(_, count)| *count < LOW_CARDINALITY_THRESHOLD)
        .map(|(name, count)| (name.clone(), *count))
        .collect()
}

fn numeric_columns(df: &DataFrame) -> impl Iterator<Item = &Column> {
    df.get_columns()
        .iter()
        .filter(|col| is_numeric_dtype(col.dtype()))
}

fn outliers(df: &DataFrame) -> PolarsResult<BTreeMap<String, usize>> {
    numeric_columns(df)
        .map(|col| {
            let values = numeric_values(col.as_materialized_series())?;
            Ok((col.name().to_string(), count_outliers(&values)))
        })
        .collect()
}

fn skewness(df: &DataFrame) -> PolarsResult<BTreeMap<String, f64>> {
    numeric_columns(df)
        .map(|col| {
            let values = numeric_values(col.as_materialized_series())?;
            let skew = round_to(calculate_skewness(&values), SKEWNESS_DECIMALS);
            Ok((col.name().to_string(), skew))
        })
        .collect()
}
