//! Natural-language summaries of anomaly reports.
//!
//! [`Summarizer::summarize`] memoizes on the report's canonical JSON: the
//! same report yields the cached text without calling the model again. The
//! memo holds at most [`SUMMARY_CACHE_CAPACITY`] entries. Failed calls are
//! never cached.

mod cache;
mod prompt;

pub use cache::{SUMMARY_CACHE_CAPACITY, SummaryCache};
pub use prompt::{SYSTEM_PROMPT, build_prompt};

use std::sync::Arc;
use tracing::{debug, info};

use crate::ai::ChatProvider;
use crate::error::SummarizeError;
use crate::types::AnomalyReport;

/// Cached, provider-backed anomaly summarizer.
#[derive(Clone)]
pub struct Summarizer {
    provider: Arc<dyn ChatProvider>,
    cache: Arc<SummaryCache>,
}

impl Summarizer {
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self::with_cache(provider, Arc::new(SummaryCache::default()))
    }

    pub fn with_cache(provider: Arc<dyn ChatProvider>, cache: Arc<SummaryCache>) -> Self {
        Self { provider, cache }
    }

    pub fn cache(&self) -> &SummaryCache {
        &self.cache
    }

    /// Summary text for `report`, from the cache when available.
    pub async fn summarize(&self, report: &AnomalyReport) -> Result<String, SummarizeError> {
        let key = report.canonical_json()?;

        if let Some(summary) = self.cache.get(&key) {
            debug!("Summary cache hit");
            return Ok(summary);
        }

        let prompt = build_prompt(report)?;
        info!(
            "Requesting summary from {} ({})",
            self.provider.name(),
            self.provider.model().unwrap_or("default model")
        );
        let summary = self.provider.complete(SYSTEM_PROMPT, &prompt).await?;

        self.cache.insert(key, summary.clone());
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider that records calls and echoes a fixed answer.
    #[derive(Default)]
    struct RecordingProvider {
        calls: AtomicUsize,
        last: Mutex<Option<(String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl ChatProvider for RecordingProvider {
        async fn complete(&self, system: &str, user: &str) -> Result<String, SummarizeError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock() = Some((system.to_string(), user.to_string()));
            if self.fail {
                return Err(SummarizeError::Api {
                    status: 500,
                    body: "upstream".to_string(),
                });
            }
            Ok(format!("Test summary {n}"))
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn report(rows: usize) -> AnomalyReport {
        AnomalyReport {
            row_count: rows,
            column_count: 1,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_summarize_sends_system_and_user_messages() {
        let provider = Arc::new(RecordingProvider::default());
        let summarizer = Summarizer::new(provider.clone());

        let summary = summarizer.summarize(&report(5)).await.unwrap();

        assert_eq!(summary, "Test summary 0");
        let (system, user) = provider.last.lock().clone().unwrap();
        assert_eq!(system, "You are a data quality expert.");
        assert!(user.contains("\"row_count\": 5"));
    }

    #[tokio::test]
    async fn test_same_report_hits_cache() {
        let provider = Arc::new(RecordingProvider::default());
        let summarizer = Summarizer::new(provider.clone());

        let first = summarizer.summarize(&report(5)).await.unwrap();
        let second = summarizer.summarize(&report(5)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_different_reports_call_provider() {
        let provider = Arc::new(RecordingProvider::default());
        let summarizer = Summarizer::new(provider.clone());

        summarizer.summarize(&report(5)).await.unwrap();
        summarizer.summarize(&report(6)).await.unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert_eq!(summarizer.cache().len(), 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let provider = Arc::new(RecordingProvider {
            fail: true,
            ..Default::default()
        });
        let summarizer = Summarizer::new(provider.clone());

        assert!(summarizer.summarize(&report(5)).await.is_err());
        assert!(summarizer.summarize(&report(5)).await.is_err());

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert!(summarizer.cache().is_empty());
    }

    #[tokio::test]
    async fn test_cache_bounded_across_many_reports() {
        let provider = Arc::new(RecordingProvider::default());
        let summarizer = Summarizer::new(provider.clone());

        for rows in 0..30 {
            summarizer.summarize(&report(rows)).await.unwrap();
        }

        assert_eq!(summarizer.cache().len(), SUMMARY_CACHE_CAPACITY);

        // The oldest report was evicted and costs another call.
        summarizer.summarize(&report(0)).await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 31);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_shared_summarizer_across_concurrent_sessions() {
        let provider = Arc::new(RecordingProvider::default());
        let summarizer = Summarizer::new(provider.clone());

        let sessions: Vec<_> = (0..8)
            .map(|session| {
                let summarizer = summarizer.clone();
                tokio::spawn(async move {
                    for i in 0..40 {
                        let rows = (session * 7 + i) % 30;
                        let summary = summarizer.summarize(&report(rows)).await.unwrap();
                        assert!(summary.starts_with("Test summary"));
                    }
                })
            })
            .collect();
        for session in sessions {
            session.await.unwrap();
        }

        let cache = summarizer.cache();
        assert!(cache.len() <= SUMMARY_CACHE_CAPACITY);
        assert!(provider.calls.load(Ordering::SeqCst) >= 30);

        // Every surviving entry is still readable and consistent with a fresh lookup.
        for rows in 0..30 {
            let key = report(rows).canonical_json().unwrap();
            if let Some(cached) = cache.get(&key) {
                assert_eq!(summarizer.summarize(&report(rows)).await.unwrap(), cached);
            }
        }
        assert!(cache.len() <= SUMMARY_CACHE_CAPACITY);
    }
}
