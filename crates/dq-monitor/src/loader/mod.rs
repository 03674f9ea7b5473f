//! Dataset loading from a relational table or an object-store CSV.
//!
//! [`DataLoader::load`] dispatches on [`DataSource`]:
//!
//! - `Relational` builds a fresh connection engine (credentials are resolved
//!   on every load), reads the whole table and closes the engine.
//! - `ObjectStore` fetches the object and parses it as CSV with a header row.
//!
//! Either way the result is a whole in-memory [`DataFrame`]; there is no
//! sampling or streaming.

mod object_store;
mod relational;

pub use object_store::{ObjectStore, S3ObjectStore, parse_csv};
pub use relational::{
    ColumnKind, ColumnSchema, ColumnValues, build_frame, introspect, quote_identifier,
    read_table, select_statement,
};

use polars::prelude::DataFrame;
use std::sync::Arc;
use tracing::info;

use crate::config::MonitorConfig;
use crate::credentials::{AwsSecretsManager, CredentialProvider, load_sdk_config};
use crate::error::LoadError;
use crate::types::DataSource;

/// Loads datasets from either supported source.
#[derive(Clone)]
pub struct DataLoader {
    credentials: CredentialProvider,
    objects: Arc<dyn ObjectStore>,
}

impl DataLoader {
    pub fn new(credentials: CredentialProvider, objects: Arc<dyn ObjectStore>) -> Self {
        Self {
            credentials,
            objects,
        }
    }

    /// Loader backed by AWS Secrets Manager and S3.
    pub async fn from_config(config: Arc<MonitorConfig>) -> Self {
        let sdk_config = load_sdk_config(&config).await;
        let secrets = Arc::new(AwsSecretsManager::new(&sdk_config));
        let objects = Arc::new(S3ObjectStore::new(&sdk_config));
        Self::new(CredentialProvider::new(secrets, config), objects)
    }

    /// Materialize `source` as a frame.
    pub async fn load(&self, source: &DataSource) -> Result<DataFrame, LoadError> {
        info!("Loading {}", source);
        match source {
            DataSource::Relational { table } => self.load_table(table).await,
            DataSource::ObjectStore { bucket, key } => self.load_object(bucket, key).await,
        }
    }

    async fn load_table(&self, table: &str) -> Result<DataFrame, LoadError> {
        let engine = self.credentials.build_engine().await?;
        let result = read_table(&engine, table).await;
        engine.close().await;
        result
    }

    async fn load_object(&self, bucket: &str, key: &str) -> Result<DataFrame, LoadError> {
        let bytes = self.objects.get_object(bucket, key).await?;
        let df = parse_csv(bytes)?;
        info!("Loaded {} rows x {} columns from s3://{}/{}", df.height(), df.width(), bucket, key);
        Ok(df)
    }
}
