use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::repository::Storage;
use crate::sqlite::SqliteInitError;

/// Environment variable holding the connection string.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Value of `DATABASE_URL` that selects the per-session in-memory store.
pub const MEMORY_URL: &str = "memory";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("database url is empty")]
    Empty,

    #[error(
        "unsupported database url {url:?}: expected `memory`, `sqlite:<path>` or `postgresql://...`"
    )]
    UnsupportedScheme { url: String },
}

/// Errors raised while opening a backend, before any goal data is touched.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageInitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),

    #[cfg(feature = "postgres")]
    #[error(transparent)]
    Postgres(#[from] crate::postgres::PostgresInitError),

    #[error("PostgreSQL url given but this build was compiled without the `postgres` feature")]
    PostgresDisabled,
}

/// Which backend a `Storage` is running on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BackendKind {
    Memory,
    Sqlite,
    Postgres,
}

impl BackendKind {
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Memory => "in-memory (session only)",
            Self::Sqlite => "SQLite",
            Self::Postgres => "PostgreSQL (pooled)",
        }
    }
}

/// Rewrite the legacy `postgres://` scheme to `postgresql://`.
///
/// Only a leading scheme is touched; the rest of the string is kept as is.
#[must_use]
pub fn normalize_database_url(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.strip_prefix("postgres://") {
        Some(rest) => format!("postgresql://{rest}"),
        None => trimmed.to_string(),
    }
}

/// A parsed, normalized connection string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DatabaseUrl {
    Memory,
    Sqlite { url: String },
    Postgres { url: String },
}

impl DatabaseUrl {
    /// Parse and normalize a connection string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the string is empty or uses an unknown scheme.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let url = normalize_database_url(raw);
        if url.is_empty() {
            return Err(ConfigError::Empty);
        }
        if url == MEMORY_URL || url == "mem:" {
            Ok(Self::Memory)
        } else if url.starts_with("sqlite:") {
            Ok(Self::Sqlite { url })
        } else if url.starts_with("postgresql://") {
            Ok(Self::Postgres { url })
        } else {
            Err(ConfigError::UnsupportedScheme { url })
        }
    }

    /// Read `DATABASE_URL`. Returns `Ok(None)` when the variable is unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the variable is set but invalid.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        match std::env::var(DATABASE_URL_ENV) {
            Ok(value) => Self::parse(&value).map(Some),
            Err(_) => Ok(None),
        }
    }

    #[must_use]
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Memory => BackendKind::Memory,
            Self::Sqlite { .. } => BackendKind::Sqlite,
            Self::Postgres { .. } => BackendKind::Postgres,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Memory => MEMORY_URL,
            Self::Sqlite { url } | Self::Postgres { url } => url,
        }
    }
}

impl Storage {
    /// Open the backend named by `url` and bring its schema up to date.
    ///
    /// # Errors
    ///
    /// Returns `StorageInitError` if the backend cannot be reached or
    /// migrated.
    pub async fn connect(url: &DatabaseUrl) -> Result<Self, StorageInitError> {
        let kind = url.kind();
        info!(backend = kind.describe(), "opening goal storage");
        let storage = match url {
            DatabaseUrl::Memory => Self::in_memory(),
            DatabaseUrl::Sqlite { url } => Self::sqlite(url).await?,
            #[cfg(feature = "postgres")]
            DatabaseUrl::Postgres { url } => {
                Self::postgres(url, &crate::postgres::PgPoolConfig::default()).await?
            }
            #[cfg(not(feature = "postgres"))]
            DatabaseUrl::Postgres { .. } => {
                tracing::error!("postgres url given without the `postgres` feature");
                return Err(StorageInitError::PostgresDisabled);
            }
        };
        info!(backend = kind.describe(), "goal storage ready");
        Ok(storage)
    }
}
