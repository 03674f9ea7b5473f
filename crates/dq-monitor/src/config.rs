//! Configuration for the data quality monitor.
//!
//! Connection parameters and API keys are read once at startup into an
//! explicit [`MonitorConfig`] that is handed to the loader, the credential
//! provider and the summarizer at construction time. Use
//! [`MonitorConfig::from_env`] in the binary and [`MonitorConfig::builder`]
//! in code and tests.
//!
//! # Environment variables
//!
//! | Variable                 | Required | Default       |
//! |--------------------------|----------|---------------|
//! | `DQ_MYSQL_HOST`          | yes      |               |
//! | `DQ_MYSQL_DB_NAME`       | yes      |               |
//! | `DQ_AWS_SECRET_NAME`     | yes      |               |
//! | `OPENAI_API_KEY`         | yes      |               |
//! | `DQ_MYSQL_PORT`          | no       | `3306`        |
//! | `DQ_AWS_REGION`          | no       | `us-east-1`   |
//! | `AWS_ACCESS_KEY_ID`      | no       | default chain |
//! | `AWS_SECRET_ACCESS_KEY`  | no       | default chain |
//! | `DQ_OPENAI_MODEL`        | no       | `gpt-4o-mini` |
//! | `DQ_OPENAI_BASE_URL`     | no       | OpenAI API    |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const ENV_MYSQL_HOST: &str = "DQ_MYSQL_HOST";
pub const ENV_MYSQL_PORT: &str = "DQ_MYSQL_PORT";
pub const ENV_MYSQL_DB_NAME: &str = "DQ_MYSQL_DB_NAME";
pub const ENV_AWS_SECRET_NAME: &str = "DQ_AWS_SECRET_NAME";
pub const ENV_AWS_REGION: &str = "DQ_AWS_REGION";
pub const ENV_AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const ENV_AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_OPENAI_MODEL: &str = "DQ_OPENAI_MODEL";
pub const ENV_OPENAI_BASE_URL: &str = "DQ_OPENAI_BASE_URL";

const DEFAULT_MYSQL_PORT: u16 = 3306;
const DEFAULT_AWS_REGION: &str = "us-east-1";

/// Errors raised while assembling or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration value '{0}'")]
    Missing(String),

    #[error("Invalid value for '{field}': {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Pooling parameters for the relational connection engine.
///
/// These are fixed by the tool; they live in configuration so tests and the
/// engine builder read them from one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Connect timeout in seconds. Default: 30
    pub connect_timeout_secs: u64,
    /// Read timeout in seconds: the longest wait for the next row of a load query. Default: 30
    pub read_timeout_secs: u64,
    /// Write timeout in seconds. The monitor never writes. Default: 30
    pub write_timeout_secs: u64,
    /// Validate pooled connections before handing them out. Default: true
    pub pre_ping: bool,
    /// Maximum connection lifetime in seconds before recycling. Default: 3600
    pub recycle_secs: u64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            read_timeout_secs: 30,
            write_timeout_secs: 30,
            pre_ping: true,
            recycle_secs: 3600,
        }
    }
}

impl EngineOptions {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn recycle_interval(&self) -> Duration {
        Duration::from_secs(self.recycle_secs)
    }
}

/// Process-wide settings, read once at startup.
#[derive(Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub mysql_host: String,
    pub mysql_port: u16,
    pub mysql_db_name: String,
    /// Identifier of the secret holding `{"username", "password"}`.
    pub aws_secret_name: String,
    pub aws_region: String,
    /// Static AWS keys. When absent the default AWS credential chain is used.
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub openai_api_key: String,
    /// Overrides the summarizer's default model.
    pub openai_model: Option<String>,
    /// Overrides the chat-completions endpoint (proxies, compatible servers).
    pub openai_base_url: Option<String>,
    pub engine: EngineOptions,
}

impl fmt::Debug for MonitorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitorConfig")
            .field("mysql_host", &self.mysql_host)
            .field("mysql_port", &self.mysql_port)
            .field("mysql_db_name", &self.mysql_db_name)
            .field("aws_secret_name", &self.aws_secret_name)
            .field("aws_region", &self.aws_region)
            .field("aws_access_key_id", &self.aws_access_key_id)
            .field(
                "aws_secret_access_key",
                &self.aws_secret_access_key.as_ref().map(|_| "***"),
            )
            .field("openai_api_key", &"***")
            .field("openai_model", &self.openai_model)
            .field("openai_base_url", &self.openai_base_url)
            .field("engine", &self.engine)
            .finish()
    }
}

impl MonitorConfig {
    /// Create a new configuration builder.
    pub fn builder() -> MonitorConfigBuilder {
        MonitorConfigBuilder::default()
    }

    /// Read configuration from the process environment.
    ///
    /// Call `dotenv().ok()` beforehand to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    ///
    /// Empty values are treated as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut builder = MonitorConfig::builder();

        if let Some(host) = get(ENV_MYSQL_HOST) {
            builder = builder.mysql_host(host);
        }
        if let Some(port) = get(ENV_MYSQL_PORT) {
            let port = port
                .trim()
                .parse::<u16>()
                .map_err(|e| ConfigError::invalid(ENV_MYSQL_PORT, e.to_string()))?;
            builder = builder.mysql_port(port);
        }
        if let Some(db) = get(ENV_MYSQL_DB_NAME) {
            builder = builder.mysql_db_name(db);
        }
        if let Some(secret) = get(ENV_AWS_SECRET_NAME) {
            builder = builder.aws_secret_name(secret);
        }
        if let Some(region) = get(ENV_AWS_REGION) {
            builder = builder.aws_region(region);
        }
        if let (Some(id), Some(secret)) = (
            get(ENV_AWS_ACCESS_KEY_ID),
            get(ENV_AWS_SECRET_ACCESS_KEY),
        ) {
            builder = builder.aws_static_keys(id, secret);
        } else if get(ENV_AWS_ACCESS_KEY_ID).is_some() || get(ENV_AWS_SECRET_ACCESS_KEY).is_some()
        {
            return Err(ConfigError::invalid(
                ENV_AWS_ACCESS_KEY_ID,
                "AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY must be set together",
            ));
        }
        if let Some(key) = get(ENV_OPENAI_API_KEY) {
            builder = builder.openai_api_key(key);
        }
        if let Some(model) = get(ENV_OPENAI_MODEL) {
            builder = builder.openai_model(model);
        }
        if let Some(url) = get(ENV_OPENAI_BASE_URL) {
            builder = builder.openai_base_url(url);
        }

        builder.build()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            (ENV_MYSQL_HOST, &self.mysql_host),
            (ENV_MYSQL_DB_NAME, &self.mysql_db_name),
            (ENV_AWS_SECRET_NAME, &self.aws_secret_name),
            (ENV_AWS_REGION, &self.aws_region),
            (ENV_OPENAI_API_KEY, &self.openai_api_key),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing(field.to_string()));
            }
        }

        if self.mysql_port == 0 {
            return Err(ConfigError::invalid(ENV_MYSQL_PORT, "port must be non-zero"));
        }

        if self.aws_access_key_id.is_some() != self.aws_secret_access_key.is_some() {
            return Err(ConfigError::invalid(
                ENV_AWS_ACCESS_KEY_ID,
                "AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY must be set together",
            ));
        }

        let engine = &self.engine;
        if engine.connect_timeout_secs == 0
            || engine.read_timeout_secs == 0
            || engine.write_timeout_secs == 0
        {
            return Err(ConfigError::invalid("engine", "timeouts must be at least 1s"));
        }

        Ok(())
    }
}

/// Builder for [`MonitorConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct MonitorConfigBuilder {
    mysql_host: Option<String>,
    mysql_port: Option<u16>,
    mysql_db_name: Option<String>,
    aws_secret_name: Option<String>,
    aws_region: Option<String>,
    aws_static_keys: Option<(String, String)>,
    openai_api_key: Option<String>,
    openai_model: Option<String>,
    openai_base_url: Option<String>,
    engine: Option<EngineOptions>,
}

impl MonitorConfigBuilder {
    pub fn mysql_host(mut self, host: impl Into<String>) -> Self {
        self.mysql_host = Some(host.into());
        self
    }

    pub fn mysql_port(mut self, port: u16) -> Self {
        self.mysql_port = Some(port);
        self
    }

    pub fn mysql_db_name(mut self, name: impl Into<String>) -> Self {
        self.mysql_db_name = Some(name.into());
        self
    }

    /// Set the identifier of the database credentials secret.
    pub fn aws_secret_name(mut self, name: impl Into<String>) -> Self {
        self.aws_secret_name = Some(name.into());
        self
    }

    pub fn aws_region(mut self, region: impl Into<String>) -> Self {
        self.aws_region = Some(region.into());
        self
    }

    /// Use static AWS keys instead of the default credential chain.
    pub fn aws_static_keys(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.aws_static_keys = Some((access_key_id.into(), secret_access_key.into()));
        self
    }

    pub fn openai_api_key(mut self, key: impl Into<String>) -> Self {
        self.openai_api_key = Some(key.into());
        self
    }

    pub fn openai_model(mut self, model: impl Into<String>) -> Self {
        self.openai_model = Some(model.into());
        self
    }

    pub fn openai_base_url(mut self, url: impl Into<String>) -> Self {
        self.openai_base_url = Some(url.into());
        self
    }

    pub fn engine(mut self, engine: EngineOptions) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `MonitorConfig`, or [`ConfigError::Missing`] naming
    /// the first required value that was not provided.
    pub fn build(self) -> Result<MonitorConfig, ConfigError> {
        let require = |value: Option<String>, field: &str| {
            value.ok_or_else(|| ConfigError::Missing(field.to_string()))
        };

        let (aws_access_key_id, aws_secret_access_key) = match self.aws_static_keys {
            Some((id, secret)) => (Some(id), Some(secret)),
            None => (None, None),
        };

        let config = MonitorConfig {
            mysql_host: require(self.mysql_host, ENV_MYSQL_HOST)?,
            mysql_port: self.mysql_port.unwrap_or(DEFAULT_MYSQL_PORT),
            mysql_db_name: require(self.mysql_db_name, ENV_MYSQL_DB_NAME)?,
            aws_secret_name: require(self.aws_secret_name, ENV_AWS_SECRET_NAME)?,
            aws_region: self
                .aws_region
                .unwrap_or_else(|| DEFAULT_AWS_REGION.to_string()),
            aws_access_key_id,
            aws_secret_access_key,
            openai_api_key: require(self.openai_api_key, ENV_OPENAI_API_KEY)?,
            openai_model: self.openai_model,
            openai_base_url: self.openai_base_url,
            engine: self.engine.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}
