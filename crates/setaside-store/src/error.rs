use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("parquet file not found: {0}")]
    ParquetNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("{0}")]
    Core(#[from] setaside_core::CoreError),

    /// Bucket creation or upload failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Crawler could not be started for a reason other than already running.
    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("query {execution_id} still running after {waited:?}")]
    QueryTimeout {
        execution_id: String,
        waited: Duration,
    },
}
