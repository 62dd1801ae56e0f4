//! Redis-backed cache store.

use super::cache_store::{CacheCounters, CacheStats, CacheStore};
use async_trait::async_trait;
use deadpool_redis::{redis::AsyncCommands, Pool};
use nestline_core::{NestlineError, NestlineResult};
use shaku::Component;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const SCAN_BATCH: u32 = 100;

/// Redis implementation of [`CacheStore`].
///
/// Built without a pool the store is disabled: reads always miss and
/// writes are no-ops, so callers fall through to their loaders.
#[derive(Component)]
#[shaku(interface = CacheStore)]
pub struct RedisCacheStore {
    #[shaku(default)]
    pool: Option<Arc<Pool>>,
    #[shaku(default)]
    stats: CacheCounters,
}

impl RedisCacheStore {
    /// Creates a store backed by the given connection pool.
    #[must_use]
    pub fn new(pool: Arc<Pool>) -> Self {
        Self {
            pool: Some(pool),
            stats: CacheCounters::default(),
        }
    }

    /// Creates a disabled store.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            pool: None,
            stats: CacheCounters::default(),
        }
    }

    async fn get_conn(&self) -> NestlineResult<deadpool_redis::Connection> {
        let pool = self
            .pool
            .as_ref()
            .ok_or_else(|| NestlineError::Cache("cache is disabled".to_string()))?;
        pool.get()
            .await
            .map_err(|e| NestlineError::Cache(format!("Failed to get Redis connection: {}", e)))
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get_raw(&self, key: &str) -> NestlineResult<Option<String>> {
        if !self.is_enabled() {
            return Ok(None);
        }

        let mut conn = self.get_conn().await?;
        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| NestlineError::Cache(format!("Redis GET failed: {}", e)))?;

        if value.is_some() {
            self.stats.record_hit();
            debug!("Cache hit for key '{}'", key);
        } else {
            self.stats.record_miss();
        }
        Ok(value)
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> NestlineResult<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        let mut conn = self.get_conn().await?;
        let ttl_secs = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, ttl_secs)
            .await
            .map_err(|e| NestlineError::Cache(format!("Redis SETEX failed: {}", e)))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> NestlineResult<bool> {
        if !self.is_enabled() {
            return Ok(false);
        }

        let mut conn = self.get_conn().await?;
        let removed: i64 = conn
            .del(key)
            .await
            .map_err(|e| NestlineError::Cache(format!("Redis DEL failed: {}", e)))?;
        Ok(removed > 0)
    }

    async fn delete_pattern(&self, pattern: &str) -> NestlineResult<u64> {
        if !self.is_enabled() {
            return Ok(0);
        }

        // SCAN rather than KEYS so invalidation never blocks the server.
        let mut conn = self.get_conn().await?;
        let mut cursor: u64 = 0;
        let mut removed: u64 = 0;
        loop {
            let (next, keys): (u64, Vec<String>) = deadpool_redis::redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(|e| NestlineError::Cache(format!("Redis SCAN failed: {}", e)))?;

            if !keys.is_empty() {
                let deleted: i64 = conn
                    .del(&keys)
                    .await
                    .map_err(|e| NestlineError::Cache(format!("Redis DEL failed: {}", e)))?;
                removed += u64::try_from(deleted).unwrap_or(0);
            }

            cursor = next;
            if cursor == 0 {
                break;
            }
        }
        Ok(removed)
    }

    fn is_enabled(&self) -> bool {
        self.pool.is_some()
    }

    fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }
}

impl std::fmt::Debug for RedisCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCacheStore")
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_store_misses_and_ignores_writes() {
        let cache = RedisCacheStore::disabled();
        assert!(!cache.is_enabled());

        cache
            .set_raw("k", "v", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get_raw("k").await.unwrap(), None);
        assert!(!cache.delete("k").await.unwrap());
        assert_eq!(cache.delete_pattern("nestline:cache:*").await.unwrap(), 0);
        assert_eq!(cache.stats(), CacheStats { hits: 0, misses: 0 });
    }
}
