//! Full-table reads from MySQL into a polars frame.
//!
//! The column list comes from `information_schema`, so the frame keeps the
//! table's column order and each column gets a typed polars dtype instead of
//! being read back as text.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use futures::{Stream, StreamExt};
use polars::prelude::*;
use sqlx::Row;
use sqlx::mysql::MySqlRow;
use std::time::Duration;
use tracing::{debug, info};

use crate::credentials::ConnectionEngine;
use crate::error::LoadError;

/// Days between 0001-01-01 (CE day 1) and the Unix epoch.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

const COLUMNS_QUERY: &str = "SELECT CAST(COLUMN_NAME AS CHAR), CAST(DATA_TYPE AS CHAR), \
     CAST(COLUMN_TYPE AS CHAR) FROM information_schema.COLUMNS \
     WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? ORDER BY ORDINAL_POSITION";

/// One column as reported by `information_schema.COLUMNS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: String,
    /// Bare type name, e.g. `int`, `varchar`.
    pub data_type: String,
    /// Full type, e.g. `int(10) unsigned`, `tinyint(1)`.
    pub column_type: String,
}

impl ColumnSchema {
    pub fn new(
        name: impl Into<String>,
        data_type: impl Into<String>,
        column_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            column_type: column_type.into(),
        }
    }

    pub fn kind(&self) -> ColumnKind {
        ColumnKind::from_mysql(&self.data_type, &self.column_type)
    }
}

/// How a MySQL column is selected, decoded and stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Int,
    UInt,
    Float,
    Date,
    DateTime,
    Text,
    Binary,
}

impl ColumnKind {
    pub fn from_mysql(data_type: &str, column_type: &str) -> Self {
        let unsigned = column_type.to_ascii_lowercase().contains("unsigned");
        match data_type.to_ascii_lowercase().as_str() {
            "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" if unsigned => {
                Self::UInt
            }
            "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" | "year" => {
                Self::Int
            }
            "bit" => Self::UInt,
            "float" | "double" | "real" | "decimal" | "numeric" => Self::Float,
            "date" => Self::Date,
            "datetime" | "timestamp" => Self::DateTime,
            "binary" | "varbinary" | "tinyblob" | "blob" | "mediumblob" | "longblob" => {
                Self::Binary
            }
            _ => Self::Text,
        }
    }

    /// Select expression that makes the driver return a decodable type.
    fn select_expr(&self, quoted: &str) -> String {
        match self {
            Self::Int => format!("CAST({quoted} AS SIGNED)"),
            Self::UInt => format!("CAST({quoted} AS UNSIGNED)"),
            // DECIMAL and FLOAT both come back as DOUBLE
            Self::Float => format!("({quoted} + 0E0)"),
            // Temporal values come back as text so zero dates can be read as missing
            Self::Date | Self::DateTime | Self::Text => format!("CAST({quoted} AS CHAR)"),
            Self::Binary => quoted.to_string(),
        }
    }
}

/// Days since the Unix epoch for a `YYYY-MM-DD` value.
///
/// Zero and otherwise invalid dates (`0000-00-00`, `2024-02-30`) yield `None`.
pub fn parse_mysql_date(value: &str) -> Option<i32> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .ok()
        .map(|d| d.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
}

/// Microseconds since the Unix epoch for a `YYYY-MM-DD HH:MM:SS[.ffffff]` value.
///
/// Zero and otherwise invalid datetimes yield `None`.
pub fn parse_mysql_datetime(value: &str) -> Option<i64> {
    NaiveDateTime::parse_from_str(value.trim(), "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|dt| dt.and_utc().timestamp_micros())
}

/// Quote an identifier with backticks, doubling embedded backticks.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Build the full-table select for a resolved schema.
pub fn select_statement(table: &str, schema: &[ColumnSchema]) -> String {
    let columns: Vec<String> = schema
        .iter()
        .map(|col| {
            let quoted = quote_identifier(&col.name);
            format!("{} AS {}", col.kind().select_expr(&quoted), quoted)
        })
        .collect();
    format!("SELECT {} FROM {}", columns.join(", "), quote_identifier(table))
}

/// Decoded values of one column, kept in their polars physical form.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Int(Vec<Option<i64>>),
    UInt(Vec<Option<u64>>),
    Float(Vec<Option<f64>>),
    /// Days since the Unix epoch.
    Date(Vec<Option<i32>>),
    /// Microseconds since the Unix epoch.
    DateTime(Vec<Option<i64>>),
    Text(Vec<Option<String>>),
}

impl ColumnValues {
    pub fn with_capacity(kind: ColumnKind, capacity: usize) -> Self {
        match kind {
            ColumnKind::Int => Self::Int(Vec::with_capacity(capacity)),
            ColumnKind::UInt => Self::UInt(Vec::with_capacity(capacity)),
            ColumnKind::Float => Self::Float(Vec::with_capacity(capacity)),
            ColumnKind::Date => Self::Date(Vec::with_capacity(capacity)),
            ColumnKind::DateTime => Self::DateTime(Vec::with_capacity(capacity)),
            ColumnKind::Text | ColumnKind::Binary => Self::Text(Vec::with_capacity(capacity)),
        }
    }

    fn push_from_row(&mut self, row: &MySqlRow, idx: usize) -> Result<(), sqlx::Error> {
        match self {
            Self::Int(values) => values.push(row.try_get::<Option<i64>, _>(idx)?),
            Self::UInt(values) => values.push(row.try_get::<Option<u64>, _>(idx)?),
            Self::Float(values) => values.push(row.try_get::<Option<f64>, _>(idx)?),
            Self::Date(values) => {
                let text = row.try_get_unchecked::<Option<String>, _>(idx)?;
                values.push(text.as_deref().and_then(parse_mysql_date));
            }
            Self::DateTime(values) => {
                let text = row.try_get_unchecked::<Option<String>, _>(idx)?;
                values.push(text.as_deref().and_then(parse_mysql_datetime));
            }
            Self::Text(values) => {
                // Binary columns share this arm; their bytes are decoded lossily.
                let bytes = row.try_get_unchecked::<Option<Vec<u8>>, _>(idx)?;
                values.push(bytes.map(|b| String::from_utf8_lossy(&b).into_owned()));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Int(v) => v.len(),
            Self::UInt(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Date(v) => v.len(),
            Self::DateTime(v) => v.len(),
            Self::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn into_column(self, name: &str) -> PolarsResult<Column> {
        let name = PlSmallStr::from(name);
        let series = match self {
            Self::Int(v) => Series::new(name, v),
            Self::UInt(v) => Series::new(name, v),
            Self::Float(v) => Series::new(name, v),
            Self::Date(v) => Series::new(name, v).cast(&DataType::Date)?,
            Self::DateTime(v) => Series::new(name, v)
                .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?,
            Self::Text(v) => Series::new(name, v),
        };
        Ok(Column::from(series))
    }
}

/// Assemble a frame from decoded columns, preserving schema order.
pub fn build_frame(
    schema: &[ColumnSchema],
    columns: Vec<ColumnValues>,
) -> PolarsResult<DataFrame> {
    let columns = schema
        .iter()
        .zip(columns)
        .map(|(col, values)| values.into_column(&col.name))
        .collect::<PolarsResult<Vec<_>>>()?;
    DataFrame::new(columns)
}

/// Resolve the column list of `table` in the connected database.
pub async fn introspect(
    engine: &ConnectionEngine,
    table: &str,
) -> Result<Vec<ColumnSchema>, LoadError> {
    let rows: Vec<(String, String, String)> = sqlx::query_as(COLUMNS_QUERY)
        .bind(table)
        .fetch_all(engine.pool())
        .await?;

    if rows.is_empty() {
        return Err(LoadError::TableNotFound(table.to_string()));
    }

    Ok(rows
        .into_iter()
        .map(|(name, data_type, column_type)| ColumnSchema::new(name, data_type, column_type))
        .collect())
}

/// Drain a row stream, failing only when one row takes longer than `idle`
/// to arrive. The transfer as a whole is unbounded.
pub async fn drain_rows<S, T>(
    mut rows: S,
    idle: Duration,
    table: &str,
) -> Result<Vec<T>, LoadError>
where
    S: Stream<Item = Result<T, sqlx::Error>> + Unpin,
{
    let mut out = Vec::new();
    loop {
        match tokio::time::timeout(idle, rows.next()).await {
            Ok(Some(row)) => out.push(row?),
            Ok(None) => return Ok(out),
            Err(_) => {
                return Err(LoadError::Timeout {
                    table: table.to_string(),
                    secs: idle.as_secs(),
                });
            }
        }
    }
}

/// Read every row of `table` into a frame.
///
/// The engine's read timeout bounds the wait for each row, not the whole read.
pub async fn read_table(engine: &ConnectionEngine, table: &str) -> Result<DataFrame, LoadError> {
    let schema = introspect(engine, table).await?;
    debug!("Table '{}' has {} columns", table, schema.len());

    let sql = select_statement(table, &schema);
    let rows = drain_rows(
        sqlx::query(&sql).fetch(engine.pool()),
        engine.read_timeout(),
        table,
    )
    .await?;

    let mut columns: Vec<ColumnValues> = schema
        .iter()
        .map(|col| ColumnValues::with_capacity(col.kind(), rows.len()))
        .collect();

    for row in &rows {
        for (idx, (values, col)) in columns.iter_mut().zip(&schema).enumerate() {
            values
                .push_from_row(row, idx)
                .map_err(|e| LoadError::Decode {
                    column: col.name.clone(),
                    reason: e.to_string(),
                })?;
        }
    }

    let df = build_frame(&schema, columns)?;
    info!("Loaded {} rows x {} columns from table '{}'", df.height(), df.width(), table);
    Ok(df)
}
