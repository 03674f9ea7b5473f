use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use super::progress::{ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate};
use crate::ai::{OpenAiConfig, OpenAiProvider};
use crate::config::{ConfigError, MonitorConfig};
use crate::detector::detect;
use crate::error::Result;
use crate::loader::DataLoader;
use crate::summarizer::Summarizer;
use crate::types::{DataSource, PREVIEW_ROWS, RunOutcome, RunReport};

/// The load -> detect -> summarize pipeline.
///
/// Runs are sequential and independent. The only state shared between runs
/// is the summarizer's cache.
///
/// # Example
///
/// ```rust,ignore
/// use dq_monitor::{DataSource, MonitorConfig, Pipeline, RunOutcome};
/// use std::sync::Arc;
///
/// let config = Arc::new(MonitorConfig::from_env()?);
/// let pipeline = Pipeline::from_config(config).await?;
///
/// match pipeline.run(&DataSource::table("orders")).await? {
///     RunOutcome::Empty { .. } => println!("No data"),
///     RunOutcome::Completed(run) => println!("{}", run.summary),
/// }
/// ```
pub struct Pipeline {
    loader: DataLoader,
    summarizer: Summarizer,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(Pipeline: Send, Sync);

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Production pipeline: AWS-backed loader and OpenAI summarizer.
    pub async fn from_config(config: Arc<MonitorConfig>) -> Result<Self> {
        Ok(PipelineBuilder::from_config(config).await?.build()?)
    }

    pub fn summarizer(&self) -> &Summarizer {
        &self.summarizer
    }

    /// Run the full pipeline against `source`.
    ///
    /// A zero-row dataset ends the run early with [`RunOutcome::Empty`]; the
    /// detector and the language model are not invoked.
    ///
    /// # Errors
    ///
    /// Credential, load and summarization failures are returned unmodified;
    /// nothing is retried.
    pub async fn run(&self, source: &DataSource) -> Result<RunOutcome> {
        match self.run_internal(source).await {
            Ok(outcome) => {
                self.report_progress(ProgressUpdate::complete("Run finished"));
                Ok(outcome)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    async fn run_internal(&self, source: &DataSource) -> Result<RunOutcome> {
        let start_time = Instant::now();

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Loading,
            0.0,
            format!("Loading {}...", source),
        ));
        let df = self.loader.load(source).await?;

        if df.height() == 0 {
            warn!("{} returned no rows", source);
            return Ok(RunOutcome::Empty {
                source: source.clone(),
                column_count: df.width(),
            });
        }

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Detecting,
            0.0,
            "Detecting anomalies...",
        ));
        let report = detect(&df);

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Summarizing,
            0.0,
            "Generating AI summary...",
        ));
        let summary = self.summarizer.summarize(&report).await?;

        let duration_ms = start_time.elapsed().as_millis() as u64;
        info!(
            "Run on {} finished in {}ms ({} rows, {} columns)",
            source, duration_ms, report.row_count, report.column_count
        );

        Ok(RunOutcome::Completed(Box::new(RunReport {
            source: source.clone(),
            preview: df.head(Some(PREVIEW_ROWS)),
            report,
            summary,
            duration_ms,
        })))
    }
}

/// Builder for [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    loader: Option<DataLoader>,
    summarizer: Option<Summarizer>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

impl PipelineBuilder {
    /// Builder preloaded with the AWS-backed loader and the OpenAI summarizer.
    ///
    /// A progress reporter can still be attached before [`build`](Self::build).
    pub async fn from_config(config: Arc<MonitorConfig>) -> Result<Self> {
        let openai_config = OpenAiConfig::from_monitor_config(&config);
        info!("Summaries will use model {}", openai_config.model);

        let provider = OpenAiProvider::with_config(config.openai_api_key.clone(), openai_config)?;
        let loader = DataLoader::from_config(config).await;

        Ok(Self::default()
            .loader(loader)
            .summarizer(Summarizer::new(Arc::new(provider))))
    }

    pub fn loader(mut self, loader: DataLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Set the summarizer. Clones share one cache, so pass a clone to reuse
    /// cached summaries across pipelines.
    pub fn summarizer(mut self, summarizer: Summarizer) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns [`ConfigError::Missing`] if the loader or summarizer was not set.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigError> {
        Ok(Pipeline {
            loader: self
                .loader
                .ok_or_else(|| ConfigError::Missing("loader".to_string()))?,
            summarizer: self
                .summarizer
                .ok_or_else(|| ConfigError::Missing("summarizer".to_string()))?,
            progress_reporter: self.progress_reporter,
        })
    }
}
