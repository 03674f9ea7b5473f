//! Data Quality Monitor Library
//!
//! Loads a tabular dataset from MySQL or from a CSV object in S3, runs a fixed
//! battery of data-quality checks over it, and asks a language model for a
//! short natural-language summary of what it found.
//!
//! # Overview
//!
//! - **Loading**: whole-table reads from MySQL (credentials from AWS Secrets
//!   Manager) or CSV objects from S3, into a polars `DataFrame`
//! - **Detection**: missing values, duplicate rows, zero-variance columns, IQR
//!   outliers, skewness and low-cardinality columns
//! - **Summaries**: OpenAI chat completions behind a bounded memo cache
//! - **Progress Reporting**: stage updates for busy indicators
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use dq_monitor::{DataSource, MonitorConfig, Pipeline, RunOutcome};
//! use std::sync::Arc;
//!
//! let config = Arc::new(MonitorConfig::from_env()?);
//! let pipeline = Pipeline::from_config(config).await?;
//!
//! match pipeline.run(&DataSource::object("lake", "daily/orders.csv")).await? {
//!     RunOutcome::Empty { source, .. } => println!("{} has no rows", source),
//!     RunOutcome::Completed(run) => {
//!         println!("{}", dq_monitor::reporting::render_dashboard(&run));
//!     }
//! }
//! ```
//!
//! The detector can also be used on its own:
//!
//! ```rust,ignore
//! use dq_monitor::detector::detect;
//!
//! let report = detect(&df);
//! println!("{} duplicate rows", report.duplicate_rows);
//! ```
//!
//! # Testing Seams
//!
//! Every external collaborator sits behind a trait so tests can substitute it:
//! [`credentials::SecretStore`], [`loader::ObjectStore`] and
//! [`ai::ChatProvider`].

pub mod ai;
pub mod config;
pub mod credentials;
pub mod detector;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod reporting;
pub mod summarizer;
pub mod types;
pub mod utils;

pub use config::{ConfigError, EngineOptions, MonitorConfig, MonitorConfigBuilder};
pub use credentials::{ConnectionEngine, CredentialProvider, SecretStore};
pub use detector::detect;
pub use error::{
    CredentialError, LoadError, MonitorError, Result as MonitorResult, ResultExt, SummarizeError,
};
pub use loader::{DataLoader, ObjectStore};
pub use pipeline::{
    ClosureProgressReporter, Pipeline, PipelineBuilder, PipelineStage, ProgressReporter,
    ProgressUpdate,
};
pub use summarizer::{SummaryCache, Summarizer};
pub use types::{AnomalyReport, Credentials, DataSource, RunOutcome, RunReport, SourceKind};
