//! Content-addressed embedding cache with per-entry expiry.
//!
//! The cache is the sole source of truth for "has this text already been
//! embedded". Entries expire lazily: an entry past its deadline is reported
//! as absent on lookup, whether or not it has been physically evicted yet.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::Embedding;
use crate::error::Result;

/// Content-derived cache key.
///
/// Identical text always yields the identical key; distinct texts collide
/// only with the probability of a SHA-256 collision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a piece of text.
    pub fn for_text(text: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// The key as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Storage backend for computed embeddings.
///
/// Implementations must be safe for concurrent use; get/set are atomic per
/// key, and last-write-wins races between writers of the same key are
/// benign because the encoding model is deterministic.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up an embedding. Returns `None` for missing or expired entries.
    async fn get(&self, key: &CacheKey) -> Result<Option<Embedding>>;

    /// Store an embedding with the given lifetime. Overwrites any existing
    /// entry for the key and refreshes its TTL.
    async fn set(&self, key: CacheKey, embedding: Embedding, ttl: Duration) -> Result<()>;

    /// Drop every entry.
    async fn clear(&self) -> Result<()>;

    /// Cache statistics.
    async fn stats(&self) -> Result<CacheStats>;
}

/// Cache entry for an embedding.
#[derive(Debug, Clone)]
struct CacheEntry {
    embedding: Embedding,
    expires_at: SystemTime,
}

impl CacheEntry {
    fn is_expired(&self, now: SystemTime) -> bool {
        self.expires_at <= now
    }
}

/// In-memory [`CacheStore`] with lazy expiry.
#[derive(Default)]
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<CacheKey, CacheEntry>>>,
}

impl MemoryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Physically drop expired entries.
    ///
    /// Lookups already treat expired entries as absent; this only reclaims
    /// memory. Returns the number of entries removed.
    pub async fn purge_expired(&self) -> usize {
        let now = SystemTime::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let purged = before - entries.len();
        if purged > 0 {
            debug!("Purged {purged} expired cache entries");
        }
        purged
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<Embedding>> {
        let entries = self.entries.read().await;
        let now = SystemTime::now();
        Ok(entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.embedding.clone()))
    }

    async fn set(&self, key: CacheKey, embedding: Embedding, ttl: Duration) -> Result<()> {
        let entry = CacheEntry {
            embedding,
            expires_at: SystemTime::now() + ttl,
        };
        self.entries.write().await.insert(key, entry);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        info!("Cleared embedding cache");
        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats> {
        let entries = self.entries.read().await;
        let now = SystemTime::now();
        let live = entries.values().filter(|e| !e.is_expired(now)).count();
        Ok(CacheStats {
            entries: entries.len(),
            live_entries: live,
        })
    }
}

/// Statistics about the embedding cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of stored entries, including not-yet-purged expired ones.
    pub entries: usize,

    /// Number of entries that are still live.
    pub live_entries: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TTL: Duration = Duration::from_secs(60);

    #[test]
    fn test_key_is_deterministic() {
        assert_eq!(CacheKey::for_text("hello"), CacheKey::for_text("hello"));
        assert_ne!(CacheKey::for_text("hello"), CacheKey::for_text("hello!"));
        // SHA-256 rendered as hex.
        assert_eq!(CacheKey::for_text("hello").as_str().len(), 64);
    }

    #[tokio::test]
    async fn test_set_get() {
        let cache = MemoryCache::new();
        let key = CacheKey::for_text("hello");
        let embedding = vec![1.0, 2.0, 3.0];

        cache.set(key.clone(), embedding.clone(), TTL).await.unwrap();

        let retrieved = cache.get(&key).await.unwrap();
        assert_eq!(retrieved, Some(embedding));
    }

    #[tokio::test]
    async fn test_miss() {
        let cache = MemoryCache::new();
        let result = cache.get(&CacheKey::for_text("not cached")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_zero_ttl_is_absent() {
        let cache = MemoryCache::new();
        let key = CacheKey::for_text("ephemeral");

        cache
            .set(key.clone(), vec![1.0], Duration::ZERO)
            .await
            .unwrap();

        assert!(cache.get(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overwrite_refreshes() {
        let cache = MemoryCache::new();
        let key = CacheKey::for_text("refresh");

        cache
            .set(key.clone(), vec![1.0], Duration::ZERO)
            .await
            .unwrap();
        cache.set(key.clone(), vec![2.0], TTL).await.unwrap();

        assert_eq!(cache.get(&key).await.unwrap(), Some(vec![2.0]));
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let cache = MemoryCache::new();
        cache
            .set(CacheKey::for_text("dead"), vec![1.0], Duration::ZERO)
            .await
            .unwrap();
        cache
            .set(CacheKey::for_text("live"), vec![2.0], TTL)
            .await
            .unwrap();

        let purged = cache.purge_expired().await;
        assert_eq!(purged, 1);

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.live_entries, 1);
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = MemoryCache::new();
        cache
            .set(CacheKey::for_text("a"), vec![1.0], TTL)
            .await
            .unwrap();
        cache.clear().await.unwrap();

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.entries, 0);
    }
}
