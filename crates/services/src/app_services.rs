use std::sync::Arc;

use storage::config::{BackendKind, DatabaseUrl};
use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::goal_service::GoalService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    backend: BackendKind,
    goal_service: Arc<GoalService>,
}

impl AppServices {
    /// Open the backend named by `url` and build services on top of it.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the backend cannot be opened or migrated.
    pub async fn connect(url: &DatabaseUrl, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::connect(url).await?;
        Ok(Self::from_storage(&storage, clock))
    }

    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_storage(&Storage::in_memory(), clock)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock) -> Self {
        Self {
            backend: storage.backend(),
            goal_service: Arc::new(GoalService::from_storage(clock, storage)),
        }
    }

    #[must_use]
    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    #[must_use]
    pub fn goal_service(&self) -> Arc<GoalService> {
        Arc::clone(&self.goal_service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracker_core::time::fixed_clock;

    #[tokio::test]
    async fn connects_to_memory_backend() {
        let services = AppServices::connect(&DatabaseUrl::Memory, fixed_clock())
            .await
            .unwrap();
        assert_eq!(services.backend(), BackendKind::Memory);
        assert!(services.goal_service().dashboard().await.is_empty());
    }

    #[tokio::test]
    async fn unreachable_postgres_is_an_init_error() {
        let url = DatabaseUrl::parse("postgresql://nobody@127.0.0.1:1/none").unwrap();
        assert!(AppServices::connect(&url, fixed_clock()).await.is_err());
    }
}
