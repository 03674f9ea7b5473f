use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::error::DisplayErrorContext;
use polars::io::csv::read::{CsvParseOptions, CsvReadOptions, NullValues};
use polars::prelude::*;
use std::io::Cursor;
use tracing::debug;

use crate::error::LoadError;

/// Read access to an object store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the full body of `bucket/key`.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, LoadError>;
}

/// S3-backed [`ObjectStore`].
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_s3::Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, LoadError> {
        let fetch_error = |reason: String| LoadError::ObjectFetch {
            bucket: bucket.to_string(),
            key: key.to_string(),
            reason,
        };

        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| fetch_error(DisplayErrorContext(&e).to_string()))?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        let bytes = body.into_bytes().to_vec();
        debug!("Fetched {} bytes from s3://{}/{}", bytes.len(), bucket, key);
        Ok(bytes)
    }
}

/// Field values read as missing in every column, in addition to empty fields.
pub const NA_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Parse a CSV payload with a header row.
///
/// Column types are inferred from the whole payload; ISO dates and
/// datetimes become temporal columns. Empty fields and [`NA_TOKENS`] are
/// missing values.
pub fn parse_csv(bytes: Vec<u8>) -> Result<DataFrame, LoadError> {
    let null_values = NullValues::AllColumns(NA_TOKENS.iter().map(|t| (*t).into()).collect());

    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .with_parse_options(
            CsvParseOptions::default()
                .with_quote_char(Some(b'"'))
                .with_try_parse_dates(true)
                .with_null_values(Some(null_values)),
        )
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(LoadError::CsvParse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_csv_infers_types() {
        let csv = "id,amount,city\n1,10.5,Oslo\n2,,Bergen\n3,7.25,\n";

        let df = parse_csv(csv.as_bytes().to_vec()).unwrap();

        assert_eq!(df.shape(), (3, 3));
        assert_eq!(df.column("id").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("amount").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("amount").unwrap().null_count(), 1);
        assert_eq!(df.column("city").unwrap().null_count(), 1);
    }

    #[test]
    fn test_parse_csv_na_tokens_are_missing() {
        let csv = "amount,label\n1.0,a\nNA,b\n2.0,N/A\nnull,c\n3.0,None\nN/A,d\n100.0,#N/A\n";

        let df = parse_csv(csv.as_bytes().to_vec()).unwrap();

        let amount = df.column("amount").unwrap();
        assert_eq!(amount.dtype(), &DataType::Float64);
        assert_eq!(amount.null_count(), 3);
        assert_eq!(df.column("label").unwrap().null_count(), 3);
    }

    #[test]
    fn test_parse_csv_header_only() {
        let df = parse_csv(b"a,b,c\n".to_vec()).unwrap();

        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), 3);
    }

    #[test]
    fn test_parse_csv_quoted_fields() {
        let csv = "name,note\n\"Smith, J\",\"said \"\"hi\"\"\"\n";

        let df = parse_csv(csv.as_bytes().to_vec()).unwrap();

        let name = df.column("name").unwrap().as_materialized_series().str().unwrap().get(0);
        assert_eq!(name, Some("Smith, J"));
    }

    #[test]
    fn test_parse_csv_late_float_is_not_truncated() {
        let mut csv = String::from("v\n");
        for i in 0..500 {
            csv.push_str(&format!("{i}\n"));
        }
        csv.push_str("0.5\n");

        let df = parse_csv(csv.into_bytes()).unwrap();

        assert_eq!(df.column("v").unwrap().dtype(), &DataType::Float64);
    }
}
