//! Shared error types for the services crate.

use thiserror::Error;

use storage::StorageInitError;
use storage::repository::StorageError;
use tracker_core::GoalInputError;

/// Errors emitted by `GoalService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GoalServiceError {
    /// Form input was rejected; the message is meant to be shown verbatim.
    #[error(transparent)]
    Invalid(#[from] GoalInputError),

    #[error("an active goal for {exercise} already exists")]
    DuplicateActiveGoal { exercise: String },

    #[error("{exercise} is at {percent:.1}% of its target; log more progress before completing it")]
    NotReached { exercise: String, percent: f64 },

    /// A mutation failed and was rolled back.
    #[error("failed to {action}: {source}")]
    Persist {
        action: &'static str,
        #[source]
        source: StorageError,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl GoalServiceError {
    pub(crate) fn persist(action: &'static str) -> impl FnOnce(StorageError) -> Self {
        move |source| Self::Persist { action, source }
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Storage(#[from] StorageInitError),
}
