#![forbid(unsafe_code)]

pub mod config;
mod mapping;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod repository;
pub mod sqlite;

pub use config::{BackendKind, ConfigError, DatabaseUrl, StorageInitError, normalize_database_url};
pub use repository::{GoalRepository, InMemoryRepository, ProgressRepository, Storage, StorageError};
