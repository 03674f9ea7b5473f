//! Language-model access for anomaly summaries.
//!
//! - [`ChatProvider`] - trait the summarizer calls
//! - [`OpenAiProvider`] - OpenAI chat-completions implementation

mod openai;
mod provider;

pub use openai::{DEFAULT_BASE_URL, DEFAULT_MODEL, OpenAiConfig, OpenAiConfigBuilder, OpenAiProvider};
pub use provider::ChatProvider;
