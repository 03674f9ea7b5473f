//! OpenAI chat-completions provider.
//!
//! Talks to `/v1/chat/completions` with bearer authentication. The base URL
//! is configurable so OpenAI-compatible gateways work unchanged.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::ChatProvider;
use crate::config::MonitorConfig;
use crate::error::SummarizeError;

/// Default OpenAI chat-completions endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default model for anomaly summaries.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default timeout for API requests in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Option<Vec<Choice>>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl ChatResponse {
    /// Text of the first choice, if any.
    fn into_content(self) -> Option<String> {
        self.choices?
            .into_iter()
            .next()?
            .message?
            .content
    }
}

/// Configuration for the OpenAI provider.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub model: String,
    /// Sampling temperature; the API default applies when unset.
    pub temperature: Option<f32>,
    /// Response token cap; the API default applies when unset.
    pub max_tokens: Option<u32>,
    pub timeout_secs: u64,
    pub base_url: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: None,
            max_tokens: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl OpenAiConfig {
    pub fn builder() -> OpenAiConfigBuilder {
        OpenAiConfigBuilder::default()
    }

    /// Apply the model and base URL overrides from process configuration.
    pub fn from_monitor_config(config: &MonitorConfig) -> Self {
        let mut builder = Self::builder();
        if let Some(model) = &config.openai_model {
            builder = builder.model(model.clone());
        }
        if let Some(base_url) = &config.openai_base_url {
            builder = builder.base_url(base_url.clone());
        }
        builder.build()
    }
}

/// Builder for [`OpenAiConfig`].
#[derive(Default)]
pub struct OpenAiConfigBuilder {
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    timeout_secs: Option<u64>,
    base_url: Option<String>,
}

impl OpenAiConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn build(self) -> OpenAiConfig {
        OpenAiConfig {
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout_secs: self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            base_url: self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }
}

/// OpenAI chat-completions provider.
///
/// # Example
///
/// ```rust,ignore
/// use dq_monitor::ai::{OpenAiConfig, OpenAiProvider};
///
/// let provider = OpenAiProvider::new("sk-...")?;
///
/// let config = OpenAiConfig::builder().model("gpt-4o").build();
/// let provider = OpenAiProvider::with_config("sk-...", config)?;
/// ```
pub struct OpenAiProvider {
    api_key: String,
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiProvider {
    /// Create a provider with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(api_key: impl Into<String>) -> Result<Self, SummarizeError> {
        Self::with_config(api_key, OpenAiConfig::default())
    }

    /// Create a provider with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_config(
        api_key: impl Into<String>,
        config: OpenAiConfig,
    ) -> Result<Self, SummarizeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            api_key: api_key.into(),
            config,
            client,
        })
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    async fn complete(&self, system: &str, user: &str) -> Result<String, SummarizeError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                Message {
                    role: "system",
                    content: system,
                },
                Message {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        debug!("Requesting completion from {} ({})", self.config.base_url, self.config.model);

        let response = self
            .client
            .post(&self.config.base_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SummarizeError::Api {
                status: status.as_u16(),
                body: response.text().await?,
            });
        }

        let result: ChatResponse = response.json().await?;
        result.into_content().ok_or(SummarizeError::EmptyResponse)
    }

    fn name(&self) -> &str {
        "OpenAI"
    }

    fn model(&self) -> Option<&str> {
        Some(&self.config.model)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // -------------------------------------------------------------------------
    // Config tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_config_defaults() {
        let config = OpenAiConfig::default();

        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.temperature, None);
    }

    #[test]
    fn test_config_builder() {
        let config = OpenAiConfig::builder()
            .model("gpt-4o")
            .temperature(0.2)
            .max_tokens(400)
            .timeout_secs(5)
            .base_url("http://localhost:8080/v1/chat/completions")
            .build();

        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.temperature, Some(0.2));
        assert_eq!(config.max_tokens, Some(400));
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.base_url, "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_config_from_monitor_config() {
        let monitor = MonitorConfig::builder()
            .mysql_host("localhost")
            .mysql_db_name("db")
            .aws_secret_name("s")
            .openai_api_key("sk-test")
            .openai_model("gpt-4.1-mini")
            .build()
            .unwrap();

        let config = OpenAiConfig::from_monitor_config(&monitor);

        assert_eq!(config.model, "gpt-4.1-mini");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    // -------------------------------------------------------------------------
    // Wire format tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_request_omits_unset_sampling_fields() {
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![
                Message {
                    role: "system",
                    content: "You are a data quality expert.",
                },
                Message {
                    role: "user",
                    content: "hi",
                },
            ],
            temperature: None,
            max_tokens: None,
        };

        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
        assert!(json.get("temperature").is_none());
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn test_response_first_choice() {
        let body = r#"{"choices": [
            {"message": {"role": "assistant", "content": "Test summary"}},
            {"message": {"role": "assistant", "content": "Other"}}
        ]}"#;

        let response: ChatResponse = serde_json::from_str(body).unwrap();

        assert_eq!(response.into_content(), Some("Test summary".to_string()));
    }

    #[test]
    fn test_response_without_content() {
        let empty: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert_eq!(empty.into_content(), None);

        let missing: ChatResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.into_content(), None);

        let null_content: ChatResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        assert_eq!(null_content.into_content(), None);
    }

    #[test]
    fn test_provider_metadata() {
        let provider = OpenAiProvider::new("sk-test").unwrap();

        assert_eq!(provider.name(), "OpenAI");
        assert_eq!(provider.model(), Some("gpt-4o-mini"));
    }
}
