//! Anonymous object-store access for CSV sources.

use crate::error::Result;
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::path::Path;
use object_store::ObjectStore;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info};

/// Read-only view of one bucket holding the source CSV files.
///
/// Access is unsigned: the source buckets are public and no credentials are
/// configured, so request signing is skipped entirely.
pub struct CsvObjectStore {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl CsvObjectStore {
    /// Create an anonymous store for the given bucket.
    ///
    /// # Arguments
    /// * `bucket` - bucket name
    /// * `region` - optional region (defaults to the SDK's configured region)
    pub fn anonymous(bucket: impl Into<String>, region: Option<&str>) -> Result<Self> {
        use object_store::aws::AmazonS3Builder;

        let bucket = bucket.into();
        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(&bucket)
            .with_skip_signature(true);

        if let Some(region) = region {
            if !region.is_empty() {
                builder = builder.with_region(region);
            }
        }

        let store = builder.build()?;

        Ok(Self {
            store: Arc::new(store),
            bucket,
        })
    }

    /// Wrap an already-built store (used by tests).
    pub fn with_store(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    /// The bucket this store reads from.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// List object keys under `prefix` whose key matches `pattern`, sorted.
    pub async fn list_keys(&self, prefix: &str, pattern: &Regex) -> Result<Vec<String>> {
        let list_prefix = if prefix.is_empty() {
            None
        } else {
            Some(Path::from(prefix))
        };

        let objects: Vec<_> = self
            .store
            .list(list_prefix.as_ref())
            .try_collect()
            .await?;

        let mut keys = filter_keys(
            objects.into_iter().map(|meta| meta.location.to_string()),
            pattern,
        );
        keys.sort();

        info!(
            bucket = %self.bucket,
            prefix = %prefix,
            matched = keys.len(),
            "Listed CSV objects"
        );
        Ok(keys)
    }

    /// Fetch one object fully into memory.
    pub async fn fetch(&self, key: &str) -> Result<Bytes> {
        debug!(bucket = %self.bucket, key = %key, "Fetching object");
        let data = self.store.get(&Path::from(key)).await?.bytes().await?;
        Ok(data)
    }
}

/// Keep the keys that match the key-name pattern.
fn filter_keys(keys: impl Iterator<Item = String>, pattern: &Regex) -> Vec<String> {
    keys.filter(|key| pattern.is_match(key)).collect()
}
