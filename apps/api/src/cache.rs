//! Cache-aside layer for read endpoints.
//!
//! Entries are JSON strings with a short TTL. Cache failures never fail a
//! request: they are logged and the value is produced from the store instead.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::errors::AppError;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

#[async_trait]
pub trait ResponseCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Redis
// ────────────────────────────────────────────────────────────────────────────

/// Redis-backed cache over one multiplexed connection shared by all handlers.
#[derive(Clone)]
pub struct RedisCache {
    conn: MultiplexedConnection,
    key_prefix: String,
}

impl RedisCache {
    pub async fn connect(url: &str, key_prefix: impl Into<String>) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self {
            conn,
            key_prefix: key_prefix.into(),
        })
    }

    fn build_key(&self, key: &str) -> String {
        if self.key_prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}:{}", self.key_prefix, key)
        }
    }
}

#[async_trait]
impl ResponseCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("GET")
            .arg(self.build_key(key))
            .query_async(&mut conn)
            .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("SET")
            .arg(self.build_key(key))
            .arg(value)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await?;
        Ok(())
    }
}

/// Used when no Redis URL is configured: every lookup misses.
pub struct NoCache;

#[async_trait]
impl ResponseCache for NoCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Cache-aside helper
// ────────────────────────────────────────────────────────────────────────────

/// Returns the cached value under `key`, or runs `produce` and caches its `Ok` result.
pub async fn cached<T, F, Fut>(
    cache: &dyn ResponseCache,
    key: &str,
    ttl: Duration,
    produce: F,
) -> Result<T, AppError>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    match cache.get(key).await {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!("Cache hit for {key}");
                return Ok(value);
            }
            Err(e) => warn!("Discarding unreadable cache entry {key}: {e}"),
        },
        Ok(None) => {}
        Err(e) => warn!("Cache lookup for {key} failed: {e}"),
    }

    let value = produce().await?;

    match serde_json::to_string(&value) {
        Ok(raw) => {
            if let Err(e) = cache.set(key, raw, ttl).await {
                warn!("Cache write for {key} failed: {e}");
            }
        }
        Err(e) => warn!("Could not serialize {key} for caching: {e}"),
    }
    Ok(value)
}

#[cfg(test)]
pub mod memory {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// Map-backed cache that ignores TTLs.
    #[derive(Default)]
    pub struct MemoryCache {
        entries: Mutex<HashMap<String, String>>,
    }

    impl MemoryCache {
        pub fn len(&self) -> usize {
            self.entries.lock().map(|e| e.len()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl ResponseCache for MemoryCache {
        async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
            Ok(self.entries.lock().ok().and_then(|e| e.get(key).cloned()))
        }

        async fn set(&self, key: &str, value: String, _ttl: Duration) -> Result<(), CacheError> {
            if let Ok(mut entries) = self.entries.lock() {
                entries.insert(key.to_string(), value);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::memory::MemoryCache;
    use super::*;

    const TTL: Duration = Duration::from_secs(1);

    #[tokio::test]
    async fn test_second_read_is_served_from_cache() {
        let cache = MemoryCache::default();
        let calls = AtomicUsize::new(0);
        for _ in 0..2 {
            let value: Vec<i64> = cached(&cache, "ids", TTL, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec![1, 2, 3])
            })
            .await
            .unwrap();
            assert_eq!(value, vec![1, 2, 3]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache = MemoryCache::default();
        let result: Result<Vec<i64>, AppError> = cached(&cache, "missing", TTL, || async {
            Err(AppError::NotFound("candidate 3".into()))
        })
        .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn test_unreadable_entry_falls_through_to_producer() {
        let cache = MemoryCache::default();
        cache.set("ids", "not json".to_string(), TTL).await.unwrap();
        let value: Vec<i64> = cached(&cache, "ids", TTL, || async { Ok(vec![7]) })
            .await
            .unwrap();
        assert_eq!(value, vec![7]);
        assert_eq!(cache.get("ids").await.unwrap().as_deref(), Some("[7]"));
    }

    #[tokio::test]
    async fn test_no_cache_always_misses() {
        let calls = AtomicUsize::new(0);
        for _ in 0..2 {
            let _: i64 = cached(&NoCache, "n", TTL, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(1)
            })
            .await
            .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
