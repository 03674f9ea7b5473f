//! Anomaly detection over a single in-memory table.
//!
//! [`detect`] runs a fixed battery of descriptive checks and returns an
//! [`AnomalyReport`](crate::types::AnomalyReport):
//!
//! - missing values per column (nulls and NaNs)
//! - duplicate rows (repeats of an earlier row)
//! - zero-variance columns (at most one distinct value)
//! - IQR outlier counts per numeric column
//! - skewness per numeric column, rounded to 2 decimals
//! - low-cardinality columns (fewer than 5 distinct values)
//! - row and column counts
//!
//! The rule set is fixed; there is no configuration.

mod anomaly;
mod statistics;

pub use anomaly::{LOW_CARDINALITY_THRESHOLD, SKEWNESS_DECIMALS, detect};
pub use statistics::IQR_MULTIPLIER;
