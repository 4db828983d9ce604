//! AWS-backed store, crawler and query engine (S3, Glue, Athena).
//!
//! Clients are built once from a shared [`SdkConfig`] and passed to the
//! pipeline; nothing here holds global state.

use std::path::Path;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_athena::types::{QueryExecutionContext, QueryExecutionState, ResultConfiguration};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};

use crate::{
    BucketStatus, CatalogCrawler, CrawlerStart, ObjectStore, QueryEngine, QueryRequest,
    QueryState, StoreError,
};

/// S3 rejects an explicit location constraint for its default region.
const S3_DEFAULT_REGION: &str = "us-east-1";

/// Load credentials and settings from the environment for `region`.
pub async fn load_sdk_config(region: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await
}

fn bucket_configuration(region: &str) -> Option<CreateBucketConfiguration> {
    (region != S3_DEFAULT_REGION).then(|| {
        CreateBucketConfiguration::builder()
            .location_constraint(BucketLocationConstraint::from(region))
            .build()
    })
}

// ── S3 ──

pub struct S3Store {
    client: aws_sdk_s3::Client,
}

impl S3Store {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_s3::Client::new(config),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn ensure_bucket(&self, bucket: &str, region: &str) -> Result<BucketStatus, StoreError> {
        let err = match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => return Ok(BucketStatus::Existed),
            Err(err) => err,
        };

        let not_found = err.as_service_error().is_some_and(|e| e.is_not_found())
            || err
                .raw_response()
                .is_some_and(|r| r.status().as_u16() == 404);
        if !not_found {
            return Err(StoreError::Storage(format!(
                "checking bucket {bucket}: {}",
                DisplayErrorContext(&err)
            )));
        }

        let create = self
            .client
            .create_bucket()
            .bucket(bucket)
            .set_create_bucket_configuration(bucket_configuration(region));

        match create.send().await {
            Ok(_) => Ok(BucketStatus::Created),
            Err(err)
                if err.as_service_error().is_some_and(|e| {
                    e.is_bucket_already_owned_by_you() || e.is_bucket_already_exists()
                }) =>
            {
                Ok(BucketStatus::Existed)
            }
            Err(err) => Err(StoreError::Storage(format!(
                "creating bucket {bucket} in {region}: {}",
                DisplayErrorContext(&err)
            ))),
        }
    }

    async fn put_file(&self, local: &Path, bucket: &str, key: &str) -> Result<(), StoreError> {
        let body = ByteStream::from_path(local)
            .await
            .map_err(|e| StoreError::Storage(format!("reading {}: {e}", local.display())))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|err| {
                StoreError::Storage(format!(
                    "uploading to s3://{bucket}/{key}: {}",
                    DisplayErrorContext(&err)
                ))
            })?;
        Ok(())
    }
}

// ── Glue ──

pub struct GlueCrawler {
    client: aws_sdk_glue::Client,
}

impl GlueCrawler {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_glue::Client::new(config),
        }
    }
}

#[async_trait]
impl CatalogCrawler for GlueCrawler {
    async fn start_crawler(&self, name: &str) -> Result<CrawlerStart, StoreError> {
        match self.client.start_crawler().name(name).send().await {
            Ok(_) => Ok(CrawlerStart::Started),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_crawler_running_exception()) =>
            {
                Ok(CrawlerStart::AlreadyRunning)
            }
            Err(err) => Err(StoreError::Catalog(format!(
                "starting crawler {name}: {}",
                DisplayErrorContext(&err)
            ))),
        }
    }
}

// ── Athena ──

pub struct AthenaEngine {
    client: aws_sdk_athena::Client,
}

impl AthenaEngine {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_athena::Client::new(config),
        }
    }
}

#[async_trait]
impl QueryEngine for AthenaEngine {
    async fn start_query(&self, request: &QueryRequest) -> Result<String, StoreError> {
        let out = self
            .client
            .start_query_execution()
            .query_string(&request.sql)
            .query_execution_context(
                QueryExecutionContext::builder()
                    .database(&request.database)
                    .build(),
            )
            .result_configuration(
                ResultConfiguration::builder()
                    .output_location(&request.output_location)
                    .build(),
            )
            .send()
            .await
            .map_err(|err| {
                StoreError::Query(format!("starting query: {}", DisplayErrorContext(&err)))
            })?;

        out.query_execution_id()
            .map(str::to_string)
            .ok_or_else(|| StoreError::Query("no execution id returned".into()))
    }

    async fn query_state(&self, execution_id: &str) -> Result<QueryState, StoreError> {
        let out = self
            .client
            .get_query_execution()
            .query_execution_id(execution_id)
            .send()
            .await
            .map_err(|err| {
                StoreError::Query(format!(
                    "checking query {execution_id}: {}",
                    DisplayErrorContext(&err)
                ))
            })?;

        let status = out.query_execution().and_then(|q| q.status());
        Ok(match status.and_then(|s| s.state()) {
            Some(QueryExecutionState::Succeeded) => QueryState::Succeeded,
            Some(QueryExecutionState::Failed) => QueryState::Failed(
                status
                    .and_then(|s| s.state_change_reason())
                    .map(str::to_string),
            ),
            Some(QueryExecutionState::Cancelled) => QueryState::Cancelled,
            Some(QueryExecutionState::Queued) => QueryState::Queued,
            _ => QueryState::Running,
        })
    }
}
