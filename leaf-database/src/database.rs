use sqlx::{PgPool, migrate::Migrator, postgres::PgPoolOptions};
use tracing::info;

use crate::cache::CacheService;

/// Compile-time discovered SQLx migrations for the `leaf-database` crate.
pub static MIGRATOR: Migrator = sqlx::migrate!();

/// Key prefix used when no cache prefix is configured.
pub const DEFAULT_CACHE_PREFIX: &str = "leaf:prod";

/// Shared database handle passed across crates.
#[derive(Clone, Debug)]
pub struct Database {
    pool: PgPool,
    cache: CacheService,
}

impl Database {
    /// Create a database handle from an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            cache: CacheService::disabled(DEFAULT_CACHE_PREFIX),
        }
    }

    /// Open a connection pool against `database_url` and wrap it with `cache`.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        cache: CacheService,
    ) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(database_url)
            .await?;
        info!(max_connections, "PostgreSQL connection established.");

        Ok(Self::with_cache(pool, cache))
    }

    /// Create a database handle from an existing pool and cache service.
    pub fn with_cache(pool: PgPool, cache: CacheService) -> Self {
        Self { pool, cache }
    }

    /// Expose the underlying pool for query modules.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Expose the cache service for query modules.
    pub fn cache(&self) -> &CacheService {
        &self.cache
    }
}
