//! Pooled PostgreSQL backend.
//!
//! Every connection is validated with a ping before it is handed out, so a
//! database restart shows up as a fresh connection rather than a failed
//! write.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{BackendKind, normalize_database_url};
use crate::mapping::db_err;
use crate::repository::{GoalRepository, ProgressRepository, Storage, StorageError};

mod migrate;
mod repo;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PostgresInitError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("database health check failed: {0}")]
    HealthCheck(StorageError),
}

/// Pool sizing and timeouts.
#[derive(Debug, Clone)]
pub struct PgPoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Option<Duration>,
}

impl Default for PgPoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: Some(Duration::from_secs(300)),
        }
    }
}

#[derive(Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Open a validated connection pool.
    ///
    /// `postgres://` urls are rewritten to `postgresql://` first.
    ///
    /// # Errors
    ///
    /// Returns `PostgresInitError` if the pool cannot be opened or the
    /// initial health check fails.
    pub async fn connect(
        database_url: &str,
        config: &PgPoolConfig,
    ) -> Result<Self, PostgresInitError> {
        let url = normalize_database_url(database_url);
        debug!(
            max_connections = config.max_connections,
            "connecting to postgres"
        );
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .test_before_acquire(true)
            .connect(&url)
            .await?;

        let repo = Self { pool };
        repo.ping().await.map_err(PostgresInitError::HealthCheck)?;
        info!("postgres pool ready");
        Ok(repo)
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Round-trip a trivial query through the pool.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` when the database is unreachable.
    pub async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Create tables if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns `PostgresInitError` if migration queries fail.
    pub async fn migrate(&self) -> Result<(), PostgresInitError> {
        migrate::run_migrations(&self.pool).await
    }
}

impl Storage {
    /// Build a `Storage` backed by a pooled PostgreSQL database.
    ///
    /// # Errors
    ///
    /// Returns `PostgresInitError` if connection or migrations fail.
    pub async fn postgres(
        database_url: &str,
        config: &PgPoolConfig,
    ) -> Result<Self, PostgresInitError> {
        let repo = PostgresRepository::connect(database_url, config).await?;
        repo.migrate().await?;
        let goals: Arc<dyn GoalRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo);
        Ok(Self::new(goals, progress, BackendKind::Postgres))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PostgresRepository>();
    }

    #[test]
    fn default_pool_is_small() {
        let config = PgPoolConfig::default();
        assert_eq!(config.max_connections, 5);
        assert!(config.min_connections <= config.max_connections);
    }
}
