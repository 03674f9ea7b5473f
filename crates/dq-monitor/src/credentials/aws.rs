use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_secretsmanager::config::Credentials as StaticCredentials;
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use tracing::debug;

use super::SecretStore;
use crate::config::MonitorConfig;
use crate::error::CredentialError;

/// Shared SDK configuration for every AWS client the monitor creates.
///
/// Uses the configured region. Static keys from the environment take
/// precedence; otherwise the default provider chain applies.
pub async fn load_sdk_config(config: &MonitorConfig) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.aws_region.clone()));

    if let (Some(key_id), Some(secret)) = (&config.aws_access_key_id, &config.aws_secret_access_key)
    {
        debug!("Using static AWS credentials from the environment");
        loader = loader.credentials_provider(StaticCredentials::new(
            key_id.clone(),
            secret.clone(),
            None,
            None,
            "dq-monitor",
        ));
    }

    loader.load().await
}

/// AWS Secrets Manager backed [`SecretStore`].
#[derive(Debug, Clone)]
pub struct AwsSecretsManager {
    client: aws_sdk_secretsmanager::Client,
}

impl AwsSecretsManager {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_secretsmanager::Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl SecretStore for AwsSecretsManager {
    async fn get_secret_string(&self, secret_id: &str) -> Result<String, CredentialError> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(secret_id)
            .send()
            .await
            .map_err(|e| CredentialError::SecretStore {
                secret_id: secret_id.to_string(),
                reason: DisplayErrorContext(&e).to_string(),
            })?;

        output
            .secret_string()
            .map(str::to_string)
            .ok_or_else(|| CredentialError::SecretMissing(secret_id.to_string()))
    }

    fn name(&self) -> &str {
        "AWS Secrets Manager"
    }
}
