//! Storage layer: Parquet files on disk, object-store publishing, catalog
//! crawls and analytic queries.

mod error;
pub use error::StoreError;

pub mod catalog;
pub mod parquet_file;
pub mod publish;
pub mod query;

pub use catalog::{CatalogCrawler, CrawlerStart, notify};
pub use parquet_file::{read_parquet, write_opportunities};
pub use publish::{BucketStatus, Destination, ObjectStore, publish};
pub use query::{
    CONTRACTS_TABLE, PollPolicy, QueryEngine, QueryOutcome, QueryRequest, QueryState, analytic_sql,
    results_location, run_query,
};

#[cfg(feature = "aws")]
mod aws;
#[cfg(feature = "aws")]
pub use aws::{AthenaEngine, GlueCrawler, S3Store, load_sdk_config};
