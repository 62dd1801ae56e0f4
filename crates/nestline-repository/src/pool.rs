//! Database connection pool management.

use async_trait::async_trait;
use nestline_config::DatabaseConfig;
use nestline_core::{Interface, NestlineError, NestlineResult};
use shaku::{Component, Module, ModuleBuildContext};
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use tracing::{info, warn};

/// Interface for database pool operations.
///
/// This trait abstracts database pool functionality for dependency injection.
#[async_trait]
pub trait DatabasePoolInterface: Interface + Send + Sync {
    /// Returns a reference to the underlying MySQL pool.
    fn inner(&self) -> &MySqlPool;

    /// Checks if the database connection is healthy.
    async fn health_check(&self) -> NestlineResult<()>;

    /// Runs database migrations.
    async fn run_migrations(&self) -> NestlineResult<()>;
}

/// Database pool wrapper.
pub struct DatabasePool {
    pool: MySqlPool,
}

impl DatabasePool {
    /// Creates a new database pool from configuration.
    pub async fn new(config: &DatabaseConfig) -> NestlineResult<Self> {
        info!("Connecting to MySQL database...");

        let pool = MySqlPoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout())
            .idle_timeout(Some(config.idle_timeout()))
            .connect(&config.url)
            .await
            .map_err(|e| {
                warn!("Failed to connect to database: {}", e);
                NestlineError::Database(format!("Failed to connect: {}", e))
            })?;

        info!("MySQL connection pool established");
        Ok(Self { pool })
    }

    /// Creates a new database pool from configuration.
    ///
    /// This is an alias for [`new`](Self::new).
    pub async fn connect(config: &DatabaseConfig) -> NestlineResult<Self> {
        Self::new(config).await
    }

    /// Returns a reference to the underlying pool.
    #[must_use]
    pub fn inner(&self) -> &MySqlPool {
        &self.pool
    }

    /// Checks if the database connection is healthy.
    pub async fn health_check(&self) -> NestlineResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| NestlineError::Database(format!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Runs database migrations.
    pub async fn run_migrations(&self) -> NestlineResult<()> {
        info!("Running database migrations...");
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| NestlineError::Database(format!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Closes the database pool.
    pub async fn close(&self) {
        info!("Closing database connection pool...");
        self.pool.close().await;
        info!("Database connection pool closed");
    }
}

#[async_trait]
impl DatabasePoolInterface for DatabasePool {
    fn inner(&self) -> &MySqlPool {
        &self.pool
    }

    async fn health_check(&self) -> NestlineResult<()> {
        Self::health_check(self).await
    }

    async fn run_migrations(&self) -> NestlineResult<()> {
        Self::run_migrations(self).await
    }
}

/// Shaku parameters for [`DatabasePool`].
///
/// The pool is created asynchronously with [`DatabasePool::new`] and handed
/// over through these parameters. When absent, a lazy pool built from
/// default connect options is substituted; it fails on first use.
#[derive(Default)]
pub struct DatabasePoolParameters {
    /// Connected pool to wrap.
    pub pool: Option<MySqlPool>,
}

impl<M: Module> Component<M> for DatabasePool {
    type Interface = dyn DatabasePoolInterface;
    type Parameters = DatabasePoolParameters;

    fn build(_context: &mut ModuleBuildContext<M>, params: Self::Parameters) -> Box<Self::Interface> {
        let pool = params
            .pool
            .unwrap_or_else(|| MySqlPool::connect_lazy_with(MySqlConnectOptions::new()));
        Box::new(Self { pool })
    }
}

impl std::ops::Deref for DatabasePool {
    type Target = MySqlPool;

    fn deref(&self) -> &Self::Target {
        &self.pool
    }
}

impl std::fmt::Debug for DatabasePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabasePool")
            .field("size", &self.pool.size())
            .field("num_idle", &self.pool.num_idle())
            .finish()
    }
}

/// Creates a shared database pool.
pub async fn create_pool(config: &DatabaseConfig) -> NestlineResult<std::sync::Arc<DatabasePool>> {
    let pool = DatabasePool::new(config).await?;
    Ok(std::sync::Arc::new(pool))
}
