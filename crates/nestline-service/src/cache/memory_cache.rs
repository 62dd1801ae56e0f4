//! In-memory cache store for embedded deployments and tests.

use super::cache_store::{CacheCounters, CacheStats, CacheStore};
use async_trait::async_trait;
use nestline_core::NestlineResult;
use parking_lot::Mutex;
use shaku::Component;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// Entry cap applied when none is configured.
pub const DEFAULT_MEMORY_ENTRIES: usize = 1000;

/// A cached value with its expiry deadline. Public only because it
/// appears in the generated component parameters.
#[derive(Debug, Clone)]
pub struct Entry {
    value: String,
    expires_at: Instant,
}

/// Process-local implementation of [`CacheStore`].
///
/// Entries expire lazily on read. When an insert would exceed the entry
/// cap, expired entries are purged first and then the entry closest to
/// expiry is evicted.
#[derive(Component)]
#[shaku(interface = CacheStore)]
pub struct MemoryCacheStore {
    #[shaku(default)]
    entries: Mutex<HashMap<String, Entry>>,
    #[shaku(default = DEFAULT_MEMORY_ENTRIES)]
    max_entries: usize,
    #[shaku(default)]
    stats: CacheCounters,
}

impl MemoryCacheStore {
    /// Creates a store holding at most `max_entries` entries. Zero means
    /// the default cap.
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_entries,
            stats: CacheCounters::default(),
        }
    }

    fn capacity(&self) -> usize {
        if self.max_entries == 0 {
            DEFAULT_MEMORY_ENTRIES
        } else {
            self.max_entries
        }
    }
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_ENTRIES)
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get_raw(&self, key: &str) -> NestlineResult<Option<String>> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get(key) {
            if entry.expires_at > now {
                let value = entry.value.clone();
                self.stats.record_hit();
                debug!("Cache hit for key '{}'", key);
                return Ok(Some(value));
            }
            entries.remove(key);
        }
        self.stats.record_miss();
        Ok(None)
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> NestlineResult<()> {
        let now = Instant::now();
        let capacity = self.capacity();
        let mut entries = self.entries.lock();

        if !entries.contains_key(key) && entries.len() >= capacity {
            entries.retain(|_, entry| entry.expires_at > now);
            if entries.len() >= capacity {
                let victim = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.expires_at)
                    .map(|(key, _)| key.clone());
                if let Some(victim) = victim {
                    entries.remove(&victim);
                }
            }
        }

        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> NestlineResult<bool> {
        let now = Instant::now();
        let removed = self.entries.lock().remove(key);
        Ok(removed.is_some_and(|entry| entry.expires_at > now))
    }

    /// Treats a trailing `*` as a prefix glob, the only pattern shape the
    /// key builders produce.
    async fn delete_pattern(&self, pattern: &str) -> NestlineResult<u64> {
        let prefix = pattern.strip_suffix('*').unwrap_or(pattern);
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok((before - entries.len()) as u64)
    }

    fn is_enabled(&self) -> bool {
        true
    }

    fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }
}

impl std::fmt::Debug for MemoryCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCacheStore")
            .field("capacity", &self.capacity())
            .field("len", &self.entries.lock().len())
            .finish_non_exhaustive()
    }
}
