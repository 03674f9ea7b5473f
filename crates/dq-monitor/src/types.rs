use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::utils::frame_rows_json;

/// Structured result of the anomaly detector.
///
/// Maps are `BTreeMap` so the serialized form is canonical (keys sorted),
/// which the summarizer relies on as its cache key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReport {
    /// Null (and NaN) count for every column, zero counts included.
    pub missing_values: BTreeMap<String, usize>,
    /// Rows that exactly repeat an earlier row.
    pub duplicate_rows: usize,
    /// Columns with at most one distinct non-missing value, in column order.
    pub zero_variance_columns: Vec<String>,
    /// IQR-fence outlier count per numeric column.
    pub outliers: BTreeMap<String, usize>,
    /// Sample skewness per numeric column, rounded to 2 decimals.
    pub skewness: BTreeMap<String, f64>,
    /// Distinct count for columns below the low-cardinality threshold.
    pub low_cardinality: BTreeMap<String, usize>,
    pub row_count: usize,
    pub column_count: usize,
}

impl AnomalyReport {
    /// Total missing cells across all columns.
    pub fn total_missing(&self) -> usize {
        self.missing_values.values().sum()
    }

    /// Total outliers across all numeric columns.
    pub fn total_outliers(&self) -> usize {
        self.outliers.values().sum()
    }

    /// Names of the columns the detector treated as numeric.
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.skewness.keys().map(String::as_str).collect()
    }

    /// Whether any check flagged something worth a look.
    pub fn has_issues(&self) -> bool {
        self.total_missing() > 0
            || self.duplicate_rows > 0
            || !self.zero_variance_columns.is_empty()
            || self.total_outliers() > 0
    }

    /// Canonical compact JSON form, used as the summary cache key.
    pub fn canonical_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Source selector, as offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// A MySQL table.
    Relational,
    /// A CSV object in S3.
    ObjectStore,
}

impl SourceKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Relational => "MySQL",
            Self::ObjectStore => "S3",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Source selector plus its locator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataSource {
    Relational { table: String },
    ObjectStore { bucket: String, key: String },
}

impl DataSource {
    pub fn table(table: impl Into<String>) -> Self {
        Self::Relational {
            table: table.into(),
        }
    }

    pub fn object(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self::ObjectStore {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Relational { .. } => SourceKind::Relational,
            Self::ObjectStore { .. } => SourceKind::ObjectStore,
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Relational { table } => write!(f, "MySQL table '{}'", table),
            Self::ObjectStore { bucket, key } => write!(f, "s3://{}/{}", bucket, key),
        }
    }
}

/// Number of leading rows kept for the data preview.
pub const PREVIEW_ROWS: usize = 5;

/// Everything a completed run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub source: DataSource,
    pub report: AnomalyReport,
    pub summary: String,
    /// First [`PREVIEW_ROWS`] rows of the loaded dataset.
    pub preview: DataFrame,
    pub duration_ms: u64,
}

impl RunReport {
    /// JSON document for machine-readable output; preview rows become
    /// objects keyed by column name.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "source": self.source,
            "report": self.report,
            "summary": self.summary,
            "preview": frame_rows_json(&self.preview),
            "duration_ms": self.duration_ms,
        })
    }
}

/// Result of a pipeline run that did not fail.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The source returned zero rows. A warning for the user, not an error.
    Empty {
        source: DataSource,
        column_count: usize,
    },
    Completed(Box<RunReport>),
}

impl RunOutcome {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty { .. })
    }

    pub fn report(&self) -> Option<&RunReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::Empty { .. } => None,
        }
    }
}

/// Database username/password pair resolved from the secret store.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}
