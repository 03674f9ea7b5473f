//! Chat provider trait for abstracting language-model calls.
//!
//! The summarizer only needs one capability: send a system message and a user
//! message, get text back. Keeping that behind [`ChatProvider`] lets tests
//! count calls with a mock and lets the endpoint be swapped for any
//! OpenAI-compatible service.

use async_trait::async_trait;

use crate::error::SummarizeError;

/// A chat-completion backend.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the pipeline shares one provider
/// across runs behind an `Arc`.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send one system + user exchange and return the first choice's text.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the API answers with a
    /// non-success status, or the response has no message content.
    async fn complete(&self, system: &str, user: &str) -> Result<String, SummarizeError>;

    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Model identifier, if the provider exposes one.
    fn model(&self) -> Option<&str> {
        None
    }
}
