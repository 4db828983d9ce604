//! Publishing the Parquet file to an object store.

use std::path::Path;

use async_trait::async_trait;
use tracing::info;

use crate::StoreError;

/// Bucket, key and region an upload is sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub bucket: String,
    pub key: String,
    pub region: String,
}

impl Destination {
    pub fn uri(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }
}

/// Outcome of [`ObjectStore::ensure_bucket`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketStatus {
    Existed,
    Created,
}

/// Minimal object-store surface needed to publish a file.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Check that `bucket` exists, creating it in `region` if it does not.
    ///
    /// "Already exists" is not an error; every other failure is
    /// [`StoreError::Storage`].
    async fn ensure_bucket(&self, bucket: &str, region: &str) -> Result<BucketStatus, StoreError>;

    /// Upload `local` to `bucket/key`, overwriting any existing object.
    async fn put_file(&self, local: &Path, bucket: &str, key: &str) -> Result<(), StoreError>;
}

/// Ensure the destination bucket exists, then upload `local` to it.
pub async fn publish(
    store: &dyn ObjectStore,
    local: &Path,
    dest: &Destination,
) -> Result<BucketStatus, StoreError> {
    if !local.exists() {
        return Err(StoreError::ParquetNotFound(local.to_path_buf()));
    }

    let status = store.ensure_bucket(&dest.bucket, &dest.region).await?;
    match status {
        BucketStatus::Created => {
            info!(bucket = %dest.bucket, region = %dest.region, "created bucket")
        }
        BucketStatus::Existed => info!(bucket = %dest.bucket, "bucket already exists"),
    }

    store.put_file(local, &dest.bucket, &dest.key).await?;
    info!(local = %local.display(), uri = %dest.uri(), "uploaded file");
    Ok(status)
}
