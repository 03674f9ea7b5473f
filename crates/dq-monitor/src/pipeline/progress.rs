//! Progress reporting for pipeline runs.
//!
//! The presentation layer uses these updates to show a busy indicator while
//! the (slow) load and summary steps are in flight.
//!
//! # Example
//!
//! ```rust,ignore
//! use dq_monitor::Pipeline;
//!
//! let pipeline = Pipeline::builder()
//!     .loader(loader)
//!     .summarizer(summarizer)
//!     .on_progress(|update| {
//!         eprintln!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?;
//! ```

use serde::{Deserialize, Serialize};

/// Stages of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Fetching the dataset from its source
    Loading,
    /// Running the anomaly checks
    Detecting,
    /// Waiting on the language model (or the summary cache)
    Summarizing,
    /// Run finished, with or without data
    Complete,
    /// Run failed with an error
    Failed,
}

impl PipelineStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Loading => "Loading Data",
            Self::Detecting => "Detecting Anomalies",
            Self::Summarizing => "Generating Summary",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Share of a whole run spent in this stage (0.0 - 1.0).
    pub fn weight(&self) -> f32 {
        match self {
            Self::Loading => 0.45,
            Self::Detecting => 0.10,
            Self::Summarizing => 0.45,
            Self::Complete | Self::Failed => 0.0,
        }
    }

    /// Cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Loading => 0.0,
            Self::Detecting => 0.45,
            Self::Summarizing => 0.55,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }

    /// Whether the run has ended.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

/// A single progress notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub stage: PipelineStage,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within current stage (0.0 - 1.0)
    pub stage_progress: f32,

    pub message: String,
}

impl ProgressUpdate {
    pub fn new(stage: PipelineStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let progress = stage.base_progress() + (stage.weight() * stage_progress);
        Self {
            stage,
            progress: progress.clamp(0.0, 1.0),
            stage_progress: stage_progress.clamp(0.0, 1.0),
            message: message.into(),
        }
    }

    pub fn complete(message: impl Into<String>) -> Self {
        Self {
            stage: PipelineStage::Complete,
            progress: 1.0,
            stage_progress: 1.0,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            stage: PipelineStage::Failed,
            progress: 0.0,
            stage_progress: 0.0,
            message: message.into(),
        }
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);

/// Receives progress updates during a run.
///
/// Implementations must be `Send + Sync`; a pipeline can be shared between
/// concurrent sessions.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// [`ProgressReporter`] backed by a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_stage_weights_cover_run() {
        let total: f32 = [
            PipelineStage::Loading,
            PipelineStage::Detecting,
            PipelineStage::Summarizing,
        ]
        .iter()
        .map(|s| s.weight())
        .sum();
        assert!((total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_progress_update_overall_progress() {
        let update = ProgressUpdate::new(PipelineStage::Summarizing, 0.0, "Generating summary");
        assert!((update.progress - 0.55).abs() < 1e-6);

        let update = ProgressUpdate::new(PipelineStage::Loading, 2.0, "overshoot");
        assert_eq!(update.stage_progress, 1.0);
        assert!((update.progress - 0.45).abs() < 1e-6);
    }

    #[test]
    fn test_terminal_stages() {
        assert!(ProgressUpdate::complete("done").stage.is_terminal());
        assert!(ProgressUpdate::failed("boom").stage.is_terminal());
        assert!(!PipelineStage::Detecting.is_terminal());
    }

    #[test]
    fn test_stage_serializes_snake_case() {
        let json = serde_json::to_string(&PipelineStage::Summarizing).unwrap();
        assert_eq!(json, "\"summarizing\"");
    }

    #[test]
    fn test_closure_reporter_forwards_updates() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let reporter = ClosureProgressReporter::new(move |update: ProgressUpdate| {
            sink.lock().push(update.stage);
        });

        reporter.report(ProgressUpdate::new(PipelineStage::Loading, 0.0, "Loading"));
        reporter.report(ProgressUpdate::complete("done"));

        assert_eq!(
            *seen.lock(),
            vec![PipelineStage::Loading, PipelineStage::Complete]
        );
    }
}
