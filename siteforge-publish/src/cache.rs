//! Publish cache: SHA-256 per object key from the last successful upload.
//!
//! Persists a [`PublishCache`] JSON document at
//! `<root>/.siteforge/publish-cache.json`. The cache is scoped to one bucket;
//! a cache written for another bucket loads as empty.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use siteforge_assets::writer::atomic_write;

use crate::error::{io_err, PublishError};

/// On-disk publish cache payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublishCache {
    pub bucket: String,
    pub published_at: DateTime<Utc>,
    /// Object key to SHA-256 hex digest.
    pub objects: BTreeMap<String, String>,
}

impl PublishCache {
    pub fn empty(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            published_at: Utc::now(),
            objects: BTreeMap::new(),
        }
    }

    /// The object is stored with exactly this digest.
    pub fn is_current(&self, key: &str, digest: &str) -> bool {
        self.objects.get(key).is_some_and(|d| d == digest)
    }

    pub fn record(&mut self, key: String, digest: String) {
        self.objects.insert(key, digest);
    }
}

/// Full SHA-256 hex digest of `bytes`.
pub fn digest(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    hex::encode(h.finalize())
}

/// Load the cache at `path` for `bucket`.
///
/// Returns an empty cache if the file does not exist or belongs to another
/// bucket.
pub fn load_at(path: &Path, bucket: &str) -> Result<PublishCache, PublishError> {
    if !path.exists() {
        return Ok(PublishCache::empty(bucket));
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let cache: PublishCache =
        serde_json::from_str(&contents).map_err(|source| PublishError::Cache {
            path: path.to_path_buf(),
            source,
        })?;
    if cache.bucket != bucket {
        tracing::debug!("publish cache is for bucket {}, starting fresh", cache.bucket);
        return Ok(PublishCache::empty(bucket));
    }
    Ok(cache)
}

/// Save the cache atomically.
pub fn save_at(path: &Path, cache: &PublishCache) -> Result<(), PublishError> {
    let json = serde_json::to_string_pretty(cache).map_err(|source| PublishError::Cache {
        path: path.to_path_buf(),
        source,
    })?;
    atomic_write(path, json.as_bytes())?;
    Ok(())
}
