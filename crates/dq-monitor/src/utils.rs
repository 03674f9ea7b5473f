//! Shared helpers for working with polars columns.

use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
///
/// Booleans are deliberately excluded; they never take part in the
/// outlier or skewness checks.
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

#[inline]
pub fn is_float_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Float32 | DataType::Float64)
}

// =============================================================================
// Series Utilities
// =============================================================================

/// Number of NaN entries in a float series. Zero for every other dtype.
pub fn nan_count(series: &Series) -> PolarsResult<usize> {
    if !is_float_dtype(series.dtype()) {
        return Ok(0);
    }
    let float_series = series.cast(&DataType::Float64)?;
    Ok(float_series
        .f64()?
        .into_iter()
        .filter(|v| matches!(v, Some(x) if x.is_nan()))
        .count())
}

/// Nulls plus NaNs, i.e. everything a reader would call "missing".
pub fn missing_count(series: &Series) -> PolarsResult<usize> {
    Ok(series.null_count() + nan_count(series)?)
}

/// The series without nulls, and without NaNs for float columns.
pub fn present_values(series: &Series) -> PolarsResult<Series> {
    let non_null = series.drop_nulls();
    if !is_float_dtype(non_null.dtype()) {
        return Ok(non_null);
    }
    let values: Vec<f64> = non_null
        .cast(&DataType::Float64)?
        .f64()?
        .into_iter()
        .flatten()
        .filter(|v| !v.is_nan())
        .collect();
    Ok(Series::new(non_null.name().clone(), values))
}

/// Distinct count over present values (missing entries are not a value).
pub fn distinct_count(series: &Series) -> PolarsResult<usize> {
    let present = present_values(series)?;
    if present.is_empty() {
        return Ok(0);
    }
    present.n_unique()
}

/// Present values of a numeric series as `f64`.
pub fn numeric_values(series: &Series) -> PolarsResult<Vec<f64>> {
    let float_series = series.cast(&DataType::Float64)?;
    Ok(float_series
        .f64()?
        .into_iter()
        .flatten()
        .filter(|v| !v.is_nan())
        .collect())
}

// =============================================================================
// Numeric Utilities
// =============================================================================

/// Quantile of already-sorted values with linear interpolation between the
/// two nearest ranks (position `(n - 1) * q`).
///
/// Returns `None` for an empty slice.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let fraction = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

// =============================================================================
// Preview Utilities
// =============================================================================

/// JSON form of a single cell. Temporal and nested values use their display
/// form; non-finite floats become `null`.
pub fn any_value_to_json(value: &AnyValue) -> serde_json::Value {
    use serde_json::Value;

    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(*b),
        AnyValue::String(s) => Value::String((*s).to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        AnyValue::Int8(v) => Value::from(*v),
        AnyValue::Int16(v) => Value::from(*v),
        AnyValue::Int32(v) => Value::from(*v),
        AnyValue::Int64(v) => Value::from(*v),
        AnyValue::UInt8(v) => Value::from(*v),
        AnyValue::UInt16(v) => Value::from(*v),
        AnyValue::UInt32(v) => Value::from(*v),
        AnyValue::UInt64(v) => Value::from(*v),
        AnyValue::Float32(v) => serde_json::Number::from_f64(f64::from(*v))
            .map(Value::Number)
            .unwrap_or(Value::Null),
        AnyValue::Float64(v) => serde_json::Number::from_f64(*v)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        other => Value::String(other.to_string()),
    }
}

/// Rows of `df` as JSON objects keyed by column name.
pub fn frame_rows_json(df: &DataFrame) -> serde_json::Value {
    let rows = (0..df.height())
        .map(|idx| {
            let row = df
                .get_columns()
                .iter()
                .map(|col| {
                    let value = col
                        .get(idx)
                        .map(|v| any_value_to_json(&v))
                        .unwrap_or(serde_json::Value::Null);
                    (col.name().to_string(), value)
                })
                .collect::<serde_json::Map<_, _>>();
            serde_json::Value::Object(row)
        })
        .collect();
    serde_json::Value::Array(rows)
}
