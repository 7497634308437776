//! Pluggable result cache with TTL semantics.
//!
//! The pipeline caches parsed result lists keyed by an opaque digest of
//! engine + query + parameters. Backends implement [`SearchCache`]; two
//! reference backends ship here: a bounded in-memory map and a persistent
//! file-per-key store. Expiry is lazy — an expired entry is deleted the
//! first time a reader touches it.
//!
//! A TTL of zero or less means the entry never expires.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::SearchError;
use crate::types::SearchResult;

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn expiry_for(ttl_seconds: i64) -> Option<u64> {
    if ttl_seconds > 0 {
        Some(epoch_secs() + ttl_seconds as u64)
    } else {
        None
    }
}

/// A keyed store of search result lists with per-entry TTL.
///
/// Implementations must tolerate concurrent `get`/`set` on distinct keys;
/// concurrent `set` on the same key is last-write-wins.
#[async_trait]
pub trait SearchCache: Send + Sync {
    /// Look up a result list. Expired entries count as absent and are
    /// deleted on the way out.
    async fn get(&self, key: &str) -> Option<Vec<SearchResult>>;

    /// Store a result list under the backend's default TTL.
    async fn set(&self, key: &str, value: &[SearchResult]) -> Result<(), SearchError>;

    /// Store a result list with an explicit TTL in seconds.
    /// `ttl_seconds <= 0` means the entry never expires.
    async fn set_with_ttl(
        &self,
        key: &str,
        value: &[SearchResult],
        ttl_seconds: i64,
    ) -> Result<(), SearchError>;

    /// Remove a key. Returns whether an entry was present.
    async fn delete(&self, key: &str) -> bool;

    /// Whether a live (non-expired) entry exists for this key.
    async fn has(&self, key: &str) -> bool {
        self.get(key).await.is_some()
    }

    /// Remove every entry.
    async fn clear(&self) -> Result<(), SearchError>;
}

// ── In-memory backend ───────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: Vec<SearchResult>,
    expires_at: Option<u64>,
    /// Insertion order, used for least-recently-created eviction.
    seq: u64,
}

/// Bounded in-process cache.
///
/// When full, the entry created longest ago is evicted to make room.
#[derive(Debug)]
pub struct MemoryCache {
    default_ttl: i64,
    max_size: usize,
    inner: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    entries: HashMap<String, MemoryEntry>,
    next_seq: u64,
}

impl MemoryCache {
    /// Create a cache holding at most `max_size` entries with the given
    /// default TTL in seconds.
    pub fn new(default_ttl: i64, max_size: usize) -> Self {
        Self {
            default_ttl,
            max_size,
            inner: Mutex::new(MemoryState::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // A poisoned cache lock means a panic mid-insert; the map itself
        // is still structurally sound, so keep serving.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MemoryCache {
    /// One hour default TTL, 1000 entries.
    fn default() -> Self {
        Self::new(3600, 1000)
    }
}

#[async_trait]
impl SearchCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<Vec<SearchResult>> {
        let mut state = self.lock();
        let expired = match state.entries.get(key) {
            Some(entry) => entry.expires_at.is_some_and(|at| at <= epoch_secs()),
            None => return None,
        };
        if expired {
            state.entries.remove(key);
            return None;
        }
        state.entries.get(key).map(|e| e.value.clone())
    }

    async fn set(&self, key: &str, value: &[SearchResult]) -> Result<(), SearchError> {
        self.set_with_ttl(key, value, self.default_ttl).await
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: &[SearchResult],
        ttl_seconds: i64,
    ) -> Result<(), SearchError> {
        let mut state = self.lock();

        if !state.entries.contains_key(key) && state.entries.len() >= self.max_size {
            if let Some(oldest) = state
                .entries
                .iter()
                .min_by_key(|(_, e)| e.seq)
                .map(|(k, _)| k.clone())
            {
                state.entries.remove(&oldest);
            }
        }

        let seq = state.next_seq;
        state.next_seq += 1;
        state.entries.insert(
            key.to_owned(),
            MemoryEntry {
                value: value.to_vec(),
                expires_at: expiry_for(ttl_seconds),
                seq,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> bool {
        self.lock().entries.remove(key).is_some()
    }

    async fn clear(&self) -> Result<(), SearchError> {
        self.lock().entries.clear();
        Ok(())
    }
}

// ── File backend ────────────────────────────────────────────────────────

/// On-disk record: one JSON file per key.
#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord {
    key: String,
    value: Vec<SearchResult>,
    created_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<u64>,
}

/// Persistent cache storing one JSON record per key.
///
/// The storage location is content-addressed: `<dir>/<sha256(key)>.json`,
/// so arbitrary keys map to stable, filesystem-safe paths. Unreadable or
/// corrupt records are treated as absent.
#[derive(Debug)]
pub struct FileCache {
    cache_dir: PathBuf,
    default_ttl: i64,
}

impl FileCache {
    /// Open (and create if needed) a cache directory with the given
    /// default TTL in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Cache`] when the directory cannot be created.
    pub fn new(cache_dir: impl Into<PathBuf>, default_ttl: i64) -> Result<Self, SearchError> {
        let cache_dir = cache_dir.into();
        std::fs::create_dir_all(&cache_dir).map_err(|e| {
            SearchError::Cache(format!(
                "failed to create cache dir {}: {e}",
                cache_dir.display()
            ))
        })?;
        Ok(Self {
            cache_dir,
            default_ttl,
        })
    }

    fn record_path(&self, key: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        self.cache_dir
            .join(format!("{:x}.json", hasher.finalize()))
    }

    fn read_record(path: &Path) -> Option<CacheRecord> {
        let raw = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&raw).ok()
    }

    /// Delete every expired record. Returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let Ok(dir) = std::fs::read_dir(&self.cache_dir) else {
            return 0;
        };
        let now = epoch_secs();
        let mut deleted = 0;
        for entry in dir.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let expired = Self::read_record(&path)
                .and_then(|r| r.expires_at)
                .is_some_and(|at| at <= now);
            if expired && std::fs::remove_file(&path).is_ok() {
                deleted += 1;
            }
        }
        deleted
    }
}

#[async_trait]
impl SearchCache for FileCache {
    async fn get(&self, key: &str) -> Option<Vec<SearchResult>> {
        let path = self.record_path(key);
        let record = Self::read_record(&path)?;
        if record.expires_at.is_some_and(|at| at <= epoch_secs()) {
            let _ = std::fs::remove_file(&path);
            return None;
        }
        Some(record.value)
    }

    async fn set(&self, key: &str, value: &[SearchResult]) -> Result<(), SearchError> {
        self.set_with_ttl(key, value, self.default_ttl).await
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: &[SearchResult],
        ttl_seconds: i64,
    ) -> Result<(), SearchError> {
        let record = CacheRecord {
            key: key.to_owned(),
            value: value.to_vec(),
            created_at: epoch_secs(),
            expires_at: expiry_for(ttl_seconds),
        };
        let raw = serde_json::to_string(&record)
            .map_err(|e| SearchError::Cache(format!("failed to encode record: {e}")))?;
        std::fs::write(self.record_path(key), raw)
            .map_err(|e| SearchError::Cache(format!("failed to write record: {e}")))
    }

    async fn delete(&self, key: &str) -> bool {
        let path = self.record_path(key);
        path.exists() && std::fs::remove_file(&path).is_ok()
    }

    async fn clear(&self) -> Result<(), SearchError> {
        let dir = std::fs::read_dir(&self.cache_dir)
            .map_err(|e| SearchError::Cache(format!("failed to read cache dir: {e}")))?;
        for entry in dir.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                std::fs::remove_file(&path)
                    .map_err(|e| SearchError::Cache(format!("failed to remove record: {e}")))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn make_results(n: usize) -> Vec<SearchResult> {
        (0..n)
            .map(|i| {
                SearchResult::new(
                    format!("Result {i}"),
                    format!("https://example{i}.com"),
                    format!("description {i}"),
                )
            })
            .collect()
    }

    // ── MemoryCache ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn memory_set_then_get_returns_value() {
        let cache = MemoryCache::default();
        let results = make_results(2);
        cache.set("k1", &results).await.expect("set");

        let got = cache.get("k1").await.expect("should hit");
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].title, "Result 0");
    }

    #[tokio::test]
    async fn memory_miss_returns_none() {
        let cache = MemoryCache::default();
        assert!(cache.get("missing").await.is_none());
    }

    #[tokio::test]
    async fn memory_delete_removes_entry() {
        let cache = MemoryCache::default();
        cache.set("k", &make_results(1)).await.expect("set");
        assert!(cache.delete("k").await);
        assert!(cache.get("k").await.is_none());
        assert!(!cache.delete("k").await);
    }

    #[tokio::test]
    async fn memory_has_and_clear() {
        let cache = MemoryCache::default();
        cache.set("k", &make_results(1)).await.expect("set");
        assert!(cache.has("k").await);
        cache.clear().await.expect("clear");
        assert!(!cache.has("k").await);
    }

    #[tokio::test]
    async fn memory_entry_expires_after_ttl() {
        let cache = MemoryCache::default();
        cache
            .set_with_ttl("k", &make_results(1), 1)
            .await
            .expect("set");
        assert!(cache.get("k").await.is_some());

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(cache.get("k").await.is_none());
        // Lazy expiry removed the entry outright.
        assert!(!cache.delete("k").await);
    }

    #[tokio::test]
    async fn memory_non_positive_ttl_never_expires() {
        let cache = MemoryCache::default();
        cache
            .set_with_ttl("forever", &make_results(1), 0)
            .await
            .expect("set");
        cache
            .set_with_ttl("also-forever", &make_results(1), -5)
            .await
            .expect("set");

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(cache.get("forever").await.is_some());
        assert!(cache.get("also-forever").await.is_some());
    }

    #[tokio::test]
    async fn memory_overwrite_same_key_updates_value() {
        let cache = MemoryCache::default();
        cache.set("k", &make_results(1)).await.expect("set");
        cache.set("k", &make_results(3)).await.expect("set");
        assert_eq!(cache.get("k").await.expect("hit").len(), 3);
    }

    #[tokio::test]
    async fn memory_evicts_least_recently_created_at_capacity() {
        let cache = MemoryCache::new(3600, 2);
        cache.set("first", &make_results(1)).await.expect("set");
        cache.set("second", &make_results(1)).await.expect("set");
        cache.set("third", &make_results(1)).await.expect("set");

        assert!(cache.get("first").await.is_none(), "oldest entry evicted");
        assert!(cache.get("second").await.is_some());
        assert!(cache.get("third").await.is_some());
    }

    #[tokio::test]
    async fn memory_overwrite_does_not_evict() {
        let cache = MemoryCache::new(3600, 2);
        cache.set("a", &make_results(1)).await.expect("set");
        cache.set("b", &make_results(1)).await.expect("set");
        // Rewriting an existing key must not push anything out.
        cache.set("a", &make_results(2)).await.expect("set");
        assert!(cache.get("a").await.is_some());
        assert!(cache.get("b").await.is_some());
    }

    // ── FileCache ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn file_set_then_get_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = FileCache::new(dir.path(), 3600).expect("open");

        let mut results = make_results(1);
        results[0].position = 7;
        results[0].engine = "bing".into();
        cache.set("engine:query:params", &results).await.expect("set");

        let got = cache.get("engine:query:params").await.expect("hit");
        assert_eq!(got[0].position, 7);
        assert_eq!(got[0].engine, "bing");
    }

    #[tokio::test]
    async fn file_record_is_content_addressed_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = FileCache::new(dir.path(), 3600).expect("open");
        cache.set("some key", &make_results(1)).await.expect("set");

        let files: Vec<_> = std::fs::read_dir(dir.path())
            .expect("read dir")
            .flatten()
            .collect();
        assert_eq!(files.len(), 1);
        let name = files[0].file_name().into_string().expect("utf8");
        // sha256 hex digest + .json
        assert_eq!(name.len(), 64 + 5);
        assert!(name.ends_with(".json"));

        let raw = std::fs::read_to_string(files[0].path()).expect("read");
        let record: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(record["key"], "some key");
        assert!(record["created_at"].is_u64());
        assert!(record["expires_at"].is_u64());
        assert!(record["value"].is_array());
    }

    #[tokio::test]
    async fn file_non_positive_ttl_omits_expiry() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = FileCache::new(dir.path(), 3600).expect("open");
        cache
            .set_with_ttl("k", &make_results(1), 0)
            .await
            .expect("set");

        let files: Vec<_> = std::fs::read_dir(dir.path())
            .expect("read dir")
            .flatten()
            .collect();
        let raw = std::fs::read_to_string(files[0].path()).expect("read");
        let record: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert!(record.get("expires_at").is_none());
        assert!(cache.get("k").await.is_some());
    }

    #[tokio::test]
    async fn file_expired_record_is_absent_and_deleted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = FileCache::new(dir.path(), 3600).expect("open");

        // Plant a record that expired a minute ago.
        let record = CacheRecord {
            key: "stale".into(),
            value: make_results(1),
            created_at: epoch_secs() - 120,
            expires_at: Some(epoch_secs() - 60),
        };
        let path = cache.record_path("stale");
        std::fs::write(&path, serde_json::to_string(&record).expect("encode")).expect("write");

        assert!(cache.get("stale").await.is_none());
        assert!(!path.exists(), "expired record eagerly deleted");
    }

    #[tokio::test]
    async fn file_corrupt_record_treated_as_absent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = FileCache::new(dir.path(), 3600).expect("open");
        std::fs::write(cache.record_path("bad"), "{not json").expect("write");
        assert!(cache.get("bad").await.is_none());
    }

    #[tokio::test]
    async fn file_delete_and_clear() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = FileCache::new(dir.path(), 3600).expect("open");
        cache.set("a", &make_results(1)).await.expect("set");
        cache.set("b", &make_results(1)).await.expect("set");

        assert!(cache.delete("a").await);
        assert!(!cache.delete("a").await);
        assert!(cache.get("b").await.is_some());

        cache.clear().await.expect("clear");
        assert!(cache.get("b").await.is_none());
    }

    #[tokio::test]
    async fn file_cleanup_expired_sweeps_only_stale_records() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = FileCache::new(dir.path(), 3600).expect("open");
        cache.set("live", &make_results(1)).await.expect("set");

        let record = CacheRecord {
            key: "stale".into(),
            value: make_results(1),
            created_at: epoch_secs() - 120,
            expires_at: Some(epoch_secs() - 60),
        };
        std::fs::write(
            cache.record_path("stale"),
            serde_json::to_string(&record).expect("encode"),
        )
        .expect("write");

        assert_eq!(cache.cleanup_expired(), 1);
        assert!(cache.get("live").await.is_some());
        assert!(cache.get("stale").await.is_none());
    }

    #[tokio::test]
    async fn backends_are_interchangeable_behind_the_trait() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backends: Vec<Box<dyn SearchCache>> = vec![
            Box::new(MemoryCache::default()),
            Box::new(FileCache::new(dir.path(), 3600).expect("open")),
        ];
        for cache in &backends {
            cache.set("shared", &make_results(2)).await.expect("set");
            assert_eq!(cache.get("shared").await.expect("hit").len(), 2);
            assert!(cache.has("shared").await);
        }
    }
}
