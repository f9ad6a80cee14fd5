use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracker_core::model::{Goal, GoalId, NewGoal, NewProgress, Progress, ProgressId};

use crate::config::BackendKind;

/// Errors surfaced by storage adapters.
///
/// A missing record is never an error: lookups return `Ok(None)` or an empty
/// `Vec` instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("conflict: an active goal with this exercise already exists")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for goals.
#[async_trait]
pub trait GoalRepository: Send + Sync {
    /// Insert a new, incomplete goal.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if an active goal already uses the
    /// same exercise name, or other storage errors. Nothing is written on
    /// failure.
    async fn add_goal(&self, goal: &NewGoal) -> Result<GoalId, StorageError>;

    /// Fetch the goal for an exercise.
    ///
    /// When several rows share the name, the active one wins, then the oldest.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get_goal(&self, exercise: &str) -> Result<Option<Goal>, StorageError>;

    /// All goals with `completed = false`, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get_active_goals(&self) -> Result<Vec<Goal>, StorageError>;

    /// Mark the active goal for `exercise` as completed.
    ///
    /// Returns `Ok(false)` when there is no active goal with that name.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the update cannot be applied.
    async fn mark_goal_complete(&self, exercise: &str) -> Result<bool, StorageError>;

    /// Flush buffered mutations. Backends that commit per call do nothing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if a pending flush fails.
    async fn save_data(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Repository contract for progress entries.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Append a progress entry. The exercise is not checked against goals.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be stored.
    async fn add_progress(&self, entry: &NewProgress) -> Result<ProgressId, StorageError>;

    /// All entries for `exercise`, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get_progress(&self, exercise: &str) -> Result<Vec<Progress>, StorageError>;
}

#[derive(Default)]
struct MemoryTables {
    goals: Vec<Goal>,
    progress: Vec<Progress>,
    next_goal_id: u64,
    next_progress_id: u64,
}

/// Per-session in-memory store.
///
/// Clones share the same tables, so one instance can back both repository
/// traits.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    tables: Arc<Mutex<MemoryTables>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryTables>, StorageError> {
        self.tables
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl GoalRepository for InMemoryRepository {
    async fn add_goal(&self, goal: &NewGoal) -> Result<GoalId, StorageError> {
        let mut guard = self.lock()?;
        if guard
            .goals
            .iter()
            .any(|g| g.is_active() && g.exercise_name() == &goal.exercise)
        {
            return Err(StorageError::Conflict);
        }
        guard.next_goal_id += 1;
        let id = GoalId::new(guard.next_goal_id);
        guard.goals.push(goal.clone().assign_id(id));
        Ok(id)
    }

    async fn get_goal(&self, exercise: &str) -> Result<Option<Goal>, StorageError> {
        let guard = self.lock()?;
        let active = guard
            .goals
            .iter()
            .find(|g| g.exercise() == exercise && g.is_active());
        let found = active.or_else(|| guard.goals.iter().find(|g| g.exercise() == exercise));
        Ok(found.cloned())
    }

    async fn get_active_goals(&self) -> Result<Vec<Goal>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.goals.iter().filter(|g| g.is_active()).cloned().collect())
    }

    async fn mark_goal_complete(&self, exercise: &str) -> Result<bool, StorageError> {
        let mut guard = self.lock()?;
        let changed = guard
            .goals
            .iter_mut()
            .find(|g| g.exercise() == exercise && g.is_active())
            .is_some_and(Goal::mark_completed);
        Ok(changed)
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn add_progress(&self, entry: &NewProgress) -> Result<ProgressId, StorageError> {
        let mut guard = self.lock()?;
        guard.next_progress_id += 1;
        let id = ProgressId::new(guard.next_progress_id);
        guard.progress.push(entry.clone().assign_id(id));
        Ok(id)
    }

    async fn get_progress(&self, exercise: &str) -> Result<Vec<Progress>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .progress
            .iter()
            .filter(|p| p.exercise() == exercise)
            .cloned()
            .collect())
    }
}

/// Aggregates goal and progress repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub goals: Arc<dyn GoalRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    backend: BackendKind,
}

impl Storage {
    #[must_use]
    pub fn new(
        goals: Arc<dyn GoalRepository>,
        progress: Arc<dyn ProgressRepository>,
        backend: BackendKind,
    ) -> Self {
        Self {
            goals,
            progress,
            backend,
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let goals: Arc<dyn GoalRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo);
        Self::new(goals, progress, BackendKind::Memory)
    }

    #[must_use]
    pub fn backend(&self) -> BackendKind {
        self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn jan(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn push_ups() -> NewGoal {
        NewGoal::new("Push-ups", 100, jan(1), 30).unwrap()
    }

    #[tokio::test]
    async fn added_goal_is_active() {
        let repo = InMemoryRepository::new();
        repo.add_goal(&push_ups()).await.unwrap();

        let active = repo.get_active_goals().await.unwrap();
        assert_eq!(active.len(), 1);
        assert!(!active[0].is_completed());
        assert_eq!(active[0].target(), 100);
    }

    #[tokio::test]
    async fn progress_sums_across_entries() {
        let repo = InMemoryRepository::new();
        repo.add_goal(&push_ups()).await.unwrap();
        repo.add_progress(&NewProgress::new("Push-ups", jan(2), 40).unwrap())
            .await
            .unwrap();
        repo.add_progress(&NewProgress::new("Push-ups", jan(3), 70).unwrap())
            .await
            .unwrap();
        repo.add_progress(&NewProgress::new("Squats", jan(3), 5).unwrap())
            .await
            .unwrap();

        let entries = repo.get_progress("Push-ups").await.unwrap();
        let total: u64 = entries.iter().map(|p| u64::from(p.quantity())).sum();
        assert_eq!(total, 110);
        assert_eq!(entries[0].quantity(), 40);
    }

    #[tokio::test]
    async fn completed_goal_leaves_active_list() {
        let repo = InMemoryRepository::new();
        repo.add_goal(&push_ups()).await.unwrap();

        assert!(repo.mark_goal_complete("Push-ups").await.unwrap());
        assert!(repo.get_active_goals().await.unwrap().is_empty());
        assert!(!repo.mark_goal_complete("Push-ups").await.unwrap());

        let goal = repo.get_goal("Push-ups").await.unwrap().unwrap();
        assert!(goal.is_completed());
    }

    #[tokio::test]
    async fn unknown_exercise_is_absent_not_error() {
        let repo = InMemoryRepository::new();
        assert!(repo.get_goal("Lunges").await.unwrap().is_none());
        assert!(repo.get_progress("Lunges").await.unwrap().is_empty());
        assert!(!repo.mark_goal_complete("Lunges").await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_active_goal_conflicts() {
        let repo = InMemoryRepository::new();
        repo.add_goal(&push_ups()).await.unwrap();
        let err = repo.add_goal(&push_ups()).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
        assert_eq!(repo.get_active_goals().await.unwrap().len(), 1);

        repo.mark_goal_complete("Push-ups").await.unwrap();
        let reused = repo.add_goal(&push_ups()).await.unwrap();
        let goal = repo.get_goal("Push-ups").await.unwrap().unwrap();
        assert_eq!(goal.id(), reused);
        assert!(goal.is_active());
    }

    #[tokio::test]
    async fn storage_handles_share_tables() {
        let storage = Storage::in_memory();
        assert_eq!(storage.backend(), BackendKind::Memory);
        storage.goals.add_goal(&push_ups()).await.unwrap();
        storage
            .progress
            .add_progress(&NewProgress::new("Push-ups", jan(1), 10).unwrap())
            .await
            .unwrap();
        storage.goals.save_data().await.unwrap();

        assert_eq!(storage.goals.get_active_goals().await.unwrap().len(), 1);
        assert_eq!(storage.progress.get_progress("Push-ups").await.unwrap().len(), 1);
    }
}
