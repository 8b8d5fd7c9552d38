//! Processed-table cache
//!
//! Keyed by the identity of the source file (path, modification time and a
//! content hash), so any edit to the file produces a new key and a fresh
//! load. Entries are immutable tables shared via `Arc`.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::sales::table::SalesTable;
use crate::sales::types::SalesError;

const DEFAULT_CAPACITY: usize = 4;

/// Everything that identifies one version of the source file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceIdentity {
    pub path: PathBuf,
    pub modified: DateTime<Utc>,
    /// Hex-encoded SHA-256 of the file contents
    pub content_hash: String,
}

impl SourceIdentity {
    /// Builds the identity from already-read file contents.
    pub fn new(path: &Path, modified: DateTime<Utc>, contents: &[u8]) -> Self {
        Self {
            path: path.to_path_buf(),
            modified,
            content_hash: content_hash(contents),
        }
    }

    /// Reads modification time from the filesystem.
    ///
    /// # Returns
    /// * `SalesError::DataSource` if the metadata cannot be read
    pub async fn from_file(path: &Path, contents: &[u8]) -> Result<Self, SalesError> {
        let modified = tokio::fs::metadata(path)
            .await
            .and_then(|metadata| metadata.modified())
            .map_err(|e| SalesError::DataSource {
                message: format!("Failed to read metadata for '{}': {}", path.display(), e),
            })?;

        Ok(Self::new(path, DateTime::<Utc>::from(modified), contents))
    }
}

pub fn content_hash(contents: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    format!("{:x}", hasher.finalize())
}

pub struct DatasetCache {
    cache: LruCache<SourceIdentity, Arc<SalesTable>>,
}

impl DatasetCache {
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity)
            .or_else(|| NonZeroUsize::new(DEFAULT_CAPACITY))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(cap),
        }
    }

    pub fn insert(&mut self, identity: SourceIdentity, table: Arc<SalesTable>) {
        self.cache.put(identity, table);
    }

    pub fn get(&mut self, identity: &SourceIdentity) -> Option<Arc<SalesTable>> {
        self.cache.get(identity).cloned()
    }

    /// Drops every cached version of `path`. Returns how many were removed.
    pub fn invalidate(&mut self, path: &Path) -> usize {
        let stale: Vec<SourceIdentity> = self
            .cache
            .iter()
            .filter(|(identity, _)| identity.path == path)
            .map(|(identity, _)| identity.clone())
            .collect();

        for identity in &stale {
            self.cache.pop(identity);
        }
        stale.len()
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn identity(path: &str, contents: &str) -> SourceIdentity {
        let modified = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        SourceIdentity::new(Path::new(path), modified, contents.as_bytes())
    }

    fn table() -> Arc<SalesTable> {
        Arc::new(SalesTable::default())
    }

    #[test]
    fn test_content_hash_is_sha256_hex() {
        assert_eq!(
            content_hash(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_ne!(content_hash(b"a"), content_hash(b"b"));
    }

    #[test]
    fn test_cache_basic_operations() {
        let mut cache = DatasetCache::new(3);

        cache.insert(identity("sales.csv", "v1"), table());
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&identity("sales.csv", "v1")).is_some());
        assert!(cache.get(&identity("sales.csv", "v2")).is_none());
    }

    #[test]
    fn test_changed_contents_miss() {
        let mut cache = DatasetCache::new(3);
        cache.insert(identity("sales.csv", "v1"), table());

        let edited = identity("sales.csv", "v1 edited");
        assert!(cache.get(&edited).is_none());
    }

    #[test]
    fn test_changed_mtime_misses() {
        let mut cache = DatasetCache::new(3);
        let original = identity("sales.csv", "v1");
        cache.insert(original.clone(), table());

        let touched = SourceIdentity {
            modified: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            ..original
        };
        assert!(cache.get(&touched).is_none());
    }

    #[test]
    fn test_cache_lru_eviction() {
        let mut cache = DatasetCache::new(2);

        cache.insert(identity("a.csv", "1"), table());
        cache.insert(identity("b.csv", "1"), table());
        cache.insert(identity("c.csv", "1"), table());

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&identity("a.csv", "1")).is_none()); // Evicted
        assert!(cache.get(&identity("b.csv", "1")).is_some());
        assert!(cache.get(&identity("c.csv", "1")).is_some());
    }

    #[test]
    fn test_invalidate_removes_every_version_of_path() {
        let mut cache = DatasetCache::new(5);

        cache.insert(identity("sales.csv", "v1"), table());
        cache.insert(identity("sales.csv", "v2"), table());
        cache.insert(identity("other.csv", "v1"), table());

        assert_eq!(cache.invalidate(Path::new("sales.csv")), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.invalidate(Path::new("missing.csv")), 0);
    }

    #[test]
    fn test_cache_clear() {
        let mut cache = DatasetCache::new(5);
        for i in 0..3 {
            cache.insert(identity(&format!("s{}.csv", i), "x"), table());
        }

        assert_eq!(cache.len(), 3);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_capacity_falls_back_to_default() {
        let mut cache = DatasetCache::new(0);
        cache.insert(identity("a.csv", "1"), table());
        cache.insert(identity("b.csv", "1"), table());
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_identity_from_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "Rank,Name\n").unwrap();

        let identity = SourceIdentity::from_file(file.path(), b"Rank,Name\n").await.unwrap();
        assert_eq!(identity.path, file.path());
        assert_eq!(identity.content_hash, content_hash(b"Rank,Name\n"));
    }

    #[tokio::test]
    async fn test_identity_of_missing_file_is_data_source_error() {
        let result = SourceIdentity::from_file(Path::new("/nonexistent/sales.csv"), b"").await;
        assert!(matches!(result, Err(SalesError::DataSource { .. })));
    }
}
