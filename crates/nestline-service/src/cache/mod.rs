//! Cache tier: cache-aside flow, key canonicalization, and the Redis
//! and in-memory store backends.

mod cache_aside;
pub mod cache_keys;
mod cache_store;
mod memory_cache;
mod redis_cache;

pub use cache_aside::{CacheAside, CachePolicy, DEFAULT_TTL, SHORT_TTL};
pub use cache_keys::CacheNamespace;
pub use cache_store::{CacheCounters, CacheStats, CacheStore};
pub use memory_cache::{MemoryCacheStore, MemoryCacheStoreParameters, DEFAULT_MEMORY_ENTRIES};
pub use redis_cache::{RedisCacheStore, RedisCacheStoreParameters};
