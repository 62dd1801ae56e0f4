//! Cache-aside read and invalidation flow over any [`CacheStore`].

use super::cache_keys::{self, CacheNamespace};
use super::cache_store::CacheStore;
use async_trait::async_trait;
use nestline_core::{NestlineError, NestlineResult};
use std::time::Duration;
use tracing::{debug, warn};

/// Default TTL for cached items (5 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Short TTL for fast-changing items (1 minute).
pub const SHORT_TTL: Duration = Duration::from_secs(60);

/// How one cached read behaves: entry lifetime plus an optional bound on
/// the miss-path load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Lifetime of a stored entry.
    pub ttl: Duration,
    /// Upper bound on the loader before the read is abandoned.
    pub loader_timeout: Option<Duration>,
}

impl CachePolicy {
    /// Creates a policy with the given TTL and no loader bound.
    #[must_use]
    pub const fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            loader_timeout: None,
        }
    }

    /// Bounds the miss-path load.
    #[must_use]
    pub const fn with_loader_timeout(mut self, limit: Duration) -> Self {
        self.loader_timeout = Some(limit);
        self
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

/// Extension trait implementing the cache-aside pattern.
///
/// The cache is an optimization, never a correctness dependency: any
/// cache-tier failure on the read path is logged and treated as a miss,
/// and any failure on the write path leaves the loaded value intact.
#[async_trait]
pub trait CacheAside: CacheStore {
    /// Get a typed value from the cache.
    async fn get<T: serde::de::DeserializeOwned + Send>(
        &self,
        key: &str,
    ) -> NestlineResult<Option<T>> {
        match self.get_raw(key).await? {
            Some(json) => {
                let value: T = serde_json::from_str(&json)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Set a typed value in the cache.
    async fn set<T: serde::Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> NestlineResult<()> {
        let json = serde_json::to_string(value)?;
        self.set_raw(key, &json, ttl).await
    }

    /// Get a value, or load and cache it on a miss.
    ///
    /// A fresh entry is returned without invoking `loader`. On a miss the
    /// loader runs (bounded by the policy's loader timeout when one is
    /// set) and its result is stored best-effort. Loader errors and
    /// timeouts propagate to the caller with nothing written, so a failed
    /// load never masks or poisons a later successful one.
    async fn get_or_load<T, F, Fut>(
        &self,
        key: &str,
        policy: CachePolicy,
        loader: F,
    ) -> NestlineResult<T>
    where
        T: serde::Serialize + serde::de::DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut + Send,
        Fut: std::future::Future<Output = NestlineResult<T>> + Send,
    {
        let cached = match self.get::<T>(key).await {
            Ok(hit) => hit,
            Err(error) => {
                warn!("Cache read failed for key '{}': {}", key, error);
                None
            }
        };
        if let Some(value) = cached {
            return Ok(value);
        }

        let value = match policy.loader_timeout {
            Some(limit) => match tokio::time::timeout(limit, loader()).await {
                Ok(loaded) => loaded?,
                Err(_) => {
                    return Err(NestlineError::Timeout(format!(
                        "load for cache key '{}' exceeded {}ms",
                        key,
                        limit.as_millis()
                    )));
                }
            },
            None => loader().await?,
        };

        if let Err(error) = self.set(key, &value, policy.ttl).await {
            warn!("Cache write failed for key '{}': {}", key, error);
        }

        Ok(value)
    }

    /// Removes one entry. Completes before returning; cache-tier errors
    /// are logged and swallowed.
    async fn invalidate(&self, key: &str) {
        if let Err(error) = self.delete(key).await {
            warn!("Cache invalidation failed for key '{}': {}", key, error);
        }
    }

    /// Removes every entry under a namespace. Completes before returning;
    /// cache-tier errors are logged and swallowed.
    async fn invalidate_namespace(&self, namespace: CacheNamespace) {
        let pattern = cache_keys::namespace_pattern(namespace);
        match self.delete_pattern(&pattern).await {
            Ok(removed) if removed > 0 => {
                debug!("Invalidated {} entries matching '{}'", removed, pattern);
            }
            Ok(_) => {}
            Err(error) => {
                warn!("Namespace invalidation failed for '{}': {}", pattern, error);
            }
        }
    }
}

// Blanket implementation for all CacheStore implementations
impl<T: CacheStore + ?Sized> CacheAside for T {}
