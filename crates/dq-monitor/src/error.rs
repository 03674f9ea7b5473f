//! Error types for the data quality monitor.
//!
//! Each component boundary has its own `thiserror` enum so the presentation
//! layer can pattern-match on the failure kind:
//!
//! - [`CredentialError`] - secret store unreachable or secret malformed
//! - [`LoadError`] - connection, introspection, fetch or parse failure
//! - [`SummarizeError`] - language-model transport or API failure
//! - [`ConfigError`](crate::config::ConfigError) - missing or invalid settings
//!
//! [`MonitorError`] wraps all of them and is serializable so the CLI can emit
//! it as JSON in `--json` mode.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

use crate::config::ConfigError;

/// Failure while resolving database credentials from the secret store.
#[derive(Error, Debug)]
pub enum CredentialError {
    /// The secret store request itself failed (network, permissions, unknown id).
    #[error("Secret store request for '{secret_id}' failed: {reason}")]
    SecretStore { secret_id: String, reason: String },

    /// The secret exists but carries no string payload.
    #[error("Secret '{0}' has no string value")]
    SecretMissing(String),

    /// The secret payload is not a JSON object with `username` and `password`.
    #[error("Secret '{secret_id}' is malformed: {reason}")]
    MalformedSecret { secret_id: String, reason: String },
}

/// Failure while materializing a dataset from a source.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Credentials for the relational source could not be resolved.
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    /// Connection or query failure reported by the database driver.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Introspection returned no columns for the requested table.
    #[error("Table '{0}' not found")]
    TableNotFound(String),

    /// No row arrived within the engine's read timeout.
    #[error("Query on table '{table}' stalled for more than {secs}s")]
    Timeout { table: String, secs: u64 },

    /// A cell could not be decoded into the column's inferred type.
    #[error("Failed to decode column '{column}': {reason}")]
    Decode { column: String, reason: String },

    /// The object store get-object call failed.
    #[error("Failed to fetch s3://{bucket}/{key}: {reason}")]
    ObjectFetch {
        bucket: String,
        key: String,
        reason: String,
    },

    /// The object body is not valid CSV.
    #[error("Failed to parse CSV: {0}")]
    CsvParse(#[source] polars::error::PolarsError),

    /// Building the in-memory frame failed.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

/// Failure while producing the natural-language summary.
#[derive(Error, Debug)]
pub enum SummarizeError {
    /// HTTP transport failure.
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the chat-completion endpoint.
    #[error("Language model API error {status}: {body}")]
    Api { status: u16, body: String },

    /// The response contained no choice or no message content.
    #[error("No response content from language model")]
    EmptyResponse,

    /// The report could not be serialized into the prompt.
    #[error("Failed to serialize anomaly report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Top-level error for a pipeline run.
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Summarization error: {0}")]
    Summarize(#[from] SummarizeError),

    /// IO error wrapper (interactive prompt, stdout).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<MonitorError>,
    },
}

impl MonitorError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        MonitorError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code for machine-readable output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Credential(_) | Self::Load(LoadError::Credential(_)) => "CREDENTIAL_ERROR",
            Self::Load(LoadError::TableNotFound(_)) => "TABLE_NOT_FOUND",
            Self::Load(LoadError::Timeout { .. }) => "LOAD_TIMEOUT",
            Self::Load(LoadError::CsvParse(_)) => "CSV_PARSE_ERROR",
            Self::Load(_) => "LOAD_ERROR",
            Self::Summarize(_) => "SUMMARIZE_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Whether the interface can simply accept another attempt.
    ///
    /// Only configuration errors require a restart with different settings.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Config(_) => false,
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => true,
        }
    }
}

/// Errors serialize as `{ "code": ..., "message": ... }`.
impl Serialize for MonitorError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("MonitorError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for monitor operations.
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<MonitorError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }
}
