//! Dependency injection module using Shaku.
//!
//! This module defines Shaku modules for the two deployment configurations:
//! - `DistributedModule`: MySQL stores with the shared Redis cache tier
//! - `EmbeddedModule`: MySQL stores with a process-local cache, for
//!   single-instance deployments and tests

use crate::cache::{
    CacheCounters, CachePolicy, CacheStore, MemoryCacheStore, MemoryCacheStoreParameters,
    RedisCacheStore, RedisCacheStoreParameters,
};
use crate::comment_service::{CommentService, CommentServiceComponent, CommentServiceComponentParameters};
use crate::post_service::{PostService, PostServiceComponent, PostServiceComponentParameters};
use crate::session_record_service::{SessionRecordService, SessionRecordServiceComponent};
use crate::vote_service::{VoteService, VoteServiceComponent};
use nestline_config::{AppConfig, CacheBackend, CacheConfig, EncryptionConfig};
use nestline_core::{NestlineError, NestlineResult};
use nestline_crypto::{AesGcmFieldCipher, AesGcmFieldCipherParameters, FieldKey};
use nestline_repository::{
    DatabasePool, DatabasePoolInterface, DatabasePoolParameters, MySqlCommentStore, MySqlPostStore,
    MySqlSessionRecordStore, MySqlVoteStore,
};
use shaku::{module, HasComponent};
use std::sync::Arc;
use tracing::warn;

// ============================================================================
// Shaku Module Definitions
// ============================================================================

// Distributed deployment module with the shared Redis cache tier.
// Contains all components for multi-instance deployments:
// - Database pool and MySQL stores
// - Redis cache store (disabled when no pool is supplied)
// - Field cipher for session record encryption
// - Forum services (post, comment, vote, session record)
module! {
    pub DistributedModule {
        components = [
            DatabasePool,
            MySqlPostStore,
            MySqlCommentStore,
            MySqlVoteStore,
            MySqlSessionRecordStore,
            RedisCacheStore,
            AesGcmFieldCipher,
            PostServiceComponent,
            CommentServiceComponent,
            VoteServiceComponent,
            SessionRecordServiceComponent,
        ],
        providers = [],
    }
}

// Embedded deployment module with a process-local cache.
// Identical to the distributed module except that cached entries live in
// the process, so invalidation does not reach other instances.
module! {
    pub EmbeddedModule {
        components = [
            DatabasePool,
            MySqlPostStore,
            MySqlCommentStore,
            MySqlVoteStore,
            MySqlSessionRecordStore,
            MemoryCacheStore,
            AesGcmFieldCipher,
            PostServiceComponent,
            CommentServiceComponent,
            VoteServiceComponent,
            SessionRecordServiceComponent,
        ],
        providers = [],
    }
}

// ============================================================================
// Module Builders
// ============================================================================

/// Builds a distributed module from configuration.
///
/// This is the main entry point for multi-instance deployments. When the
/// cache tier is disabled, or configured for another backend, the Redis
/// store is wired without a pool and every read goes to the database.
pub async fn build_distributed_module(config: &AppConfig) -> NestlineResult<Arc<DistributedModule>> {
    // Create database pool (async operation)
    let db_pool = DatabasePool::connect(&config.database).await?;

    // Create Redis cache pool (if enabled)
    let cache_pool = if config.cache.enabled && config.cache.backend == CacheBackend::Redis {
        let mut redis_cfg = deadpool_redis::Config::from_url(&config.cache.url);
        redis_cfg.pool = Some(deadpool_redis::PoolConfig::new(config.cache.pool_size as usize));
        let pool = redis_cfg
            .create_pool(Some(deadpool_redis::Runtime::Tokio1))
            .map_err(|e| NestlineError::Cache(format!("Failed to create Redis pool: {}", e)))?;
        Some(Arc::new(pool))
    } else {
        None
    };

    let (default_policy, short_policy) = cache_policies(&config.cache);

    // Build the module with parameters
    let module = DistributedModule::builder()
        .with_component_parameters::<DatabasePool>(DatabasePoolParameters {
            pool: Some(db_pool.inner().clone()),
        })
        .with_component_parameters::<RedisCacheStore>(RedisCacheStoreParameters {
            pool: cache_pool,
            stats: CacheCounters::default(),
        })
        .with_component_parameters::<AesGcmFieldCipher>(AesGcmFieldCipherParameters {
            key: field_key(&config.encryption)?,
        })
        .with_component_parameters::<PostServiceComponent>(PostServiceComponentParameters {
            cache_policy: default_policy,
            trending_policy: short_policy,
        })
        .with_component_parameters::<CommentServiceComponent>(CommentServiceComponentParameters {
            cache_policy: default_policy,
        })
        .build();

    Ok(Arc::new(module))
}

/// Builds an embedded module from configuration.
///
/// Use this for single-instance deployments where a Redis tier is not
/// worth running. Cached entries live in the process.
pub async fn build_embedded_module(config: &AppConfig) -> NestlineResult<Arc<EmbeddedModule>> {
    // Create database pool (async operation)
    let db_pool = DatabasePool::connect(&config.database).await?;

    let (default_policy, short_policy) = cache_policies(&config.cache);

    // Build the module with parameters
    let module = EmbeddedModule::builder()
        .with_component_parameters::<DatabasePool>(DatabasePoolParameters {
            pool: Some(db_pool.inner().clone()),
        })
        .with_component_parameters::<MemoryCacheStore>(MemoryCacheStoreParameters {
            max_entries: config.cache.max_memory_entries,
            ..Default::default()
        })
        .with_component_parameters::<AesGcmFieldCipher>(AesGcmFieldCipherParameters {
            key: field_key(&config.encryption)?,
        })
        .with_component_parameters::<PostServiceComponent>(PostServiceComponentParameters {
            cache_policy: default_policy,
            trending_policy: short_policy,
        })
        .with_component_parameters::<CommentServiceComponent>(CommentServiceComponentParameters {
            cache_policy: default_policy,
        })
        .build();

    Ok(Arc::new(module))
}

/// Derives the cache policies for the service components.
///
/// Returns the default policy and the short-TTL policy for fast-changing
/// entries, both carrying the configured loader bound.
fn cache_policies(config: &CacheConfig) -> (CachePolicy, CachePolicy) {
    let mut default_policy = CachePolicy::new(config.default_ttl());
    let mut short_policy = CachePolicy::new(config.short_ttl());
    if let Some(limit) = config.loader_timeout() {
        default_policy = default_policy.with_loader_timeout(limit);
        short_policy = short_policy.with_loader_timeout(limit);
    }
    (default_policy, short_policy)
}

/// Decodes the configured field encryption key.
fn field_key(config: &EncryptionConfig) -> NestlineResult<FieldKey> {
    if config.is_dev_key() {
        warn!("Field encryption is using the development placeholder key");
    }
    Ok(FieldKey::new(config.decoded_key()?))
}

// ============================================================================
// Module Resolution Helpers
// ============================================================================

/// Trait for resolving the forum services from any module.
pub trait ServiceResolver {
    /// Resolves the post service from the module.
    fn post_service(&self) -> Arc<dyn PostService>;

    /// Resolves the comment service from the module.
    fn comment_service(&self) -> Arc<dyn CommentService>;

    /// Resolves the vote service from the module.
    fn vote_service(&self) -> Arc<dyn VoteService>;

    /// Resolves the session record service from the module.
    fn session_record_service(&self) -> Arc<dyn SessionRecordService>;
}

impl ServiceResolver for DistributedModule {
    fn post_service(&self) -> Arc<dyn PostService> {
        self.resolve()
    }

    fn comment_service(&self) -> Arc<dyn CommentService> {
        self.resolve()
    }

    fn vote_service(&self) -> Arc<dyn VoteService> {
        self.resolve()
    }

    fn session_record_service(&self) -> Arc<dyn SessionRecordService> {
        self.resolve()
    }
}

impl ServiceResolver for EmbeddedModule {
    fn post_service(&self) -> Arc<dyn PostService> {
        self.resolve()
    }

    fn comment_service(&self) -> Arc<dyn CommentService> {
        self.resolve()
    }

    fn vote_service(&self) -> Arc<dyn VoteService> {
        self.resolve()
    }

    fn session_record_service(&self) -> Arc<dyn SessionRecordService> {
        self.resolve()
    }
}

/// Trait for resolving the cache store.
pub trait CacheResolver {
    /// Resolves the cache store from the module.
    fn cache(&self) -> Arc<dyn CacheStore>;
}

impl CacheResolver for DistributedModule {
    fn cache(&self) -> Arc<dyn CacheStore> {
        self.resolve()
    }
}

impl CacheResolver for EmbeddedModule {
    fn cache(&self) -> Arc<dyn CacheStore> {
        self.resolve()
    }
}

/// Trait for resolving the database pool from modules that have it.
pub trait DatabaseResolver {
    /// Resolves the database pool from the module.
    fn database_pool(&self) -> Arc<dyn DatabasePoolInterface>;
}

impl DatabaseResolver for DistributedModule {
    fn database_pool(&self) -> Arc<dyn DatabasePoolInterface> {
        self.resolve()
    }
}

impl DatabaseResolver for EmbeddedModule {
    fn database_pool(&self) -> Arc<dyn DatabasePoolInterface> {
        self.resolve()
    }
}
