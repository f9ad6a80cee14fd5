use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use storage::repository::{GoalRepository, ProgressRepository, Storage, StorageError};
use tracker_core::GoalInputError;
use tracker_core::model::{Goal, GoalDraft, GoalId, NewProgress, Progress, ProgressId};

use crate::Clock;
use crate::error::GoalServiceError;
use crate::view::{Dashboard, GoalProgressView, GoalSnapshot};

/// Presentation-facing facade over the goal and progress stores.
///
/// This service owns:
/// - the time source used for "today"
/// - input validation before anything is written
/// - the rule that a goal is completed only after reaching its target
///
/// After any mutation, callers re-read [`GoalService::dashboard`] to render.
#[derive(Clone)]
pub struct GoalService {
    clock: Clock,
    goals: Arc<dyn GoalRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl GoalService {
    #[must_use]
    pub fn new(
        clock: Clock,
        goals: Arc<dyn GoalRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            goals,
            progress,
        }
    }

    #[must_use]
    pub fn from_storage(clock: Clock, storage: &Storage) -> Self {
        Self::new(
            clock,
            Arc::clone(&storage.goals),
            Arc::clone(&storage.progress),
        )
    }

    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_storage(clock, &Storage::in_memory())
    }

    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Validate a goal form submission and store it.
    ///
    /// # Errors
    ///
    /// Returns `GoalServiceError::Invalid` for rejected input,
    /// `GoalServiceError::DuplicateActiveGoal` if the exercise already has an
    /// active goal, or `GoalServiceError::Persist` if the write fails.
    pub async fn set_goal(&self, draft: GoalDraft) -> Result<GoalId, GoalServiceError> {
        let goal = draft.validate()?;
        let id = self.goals.add_goal(&goal).await.map_err(|err| match err {
            StorageError::Conflict => GoalServiceError::DuplicateActiveGoal {
                exercise: goal.exercise.to_string(),
            },
            other => GoalServiceError::Persist {
                action: "add goal",
                source: other,
            },
        })?;
        info!(exercise = %goal.exercise, target = goal.target, %id, "goal set");
        Ok(id)
    }

    /// Log `quantity` against `exercise` for today.
    ///
    /// # Errors
    ///
    /// See [`GoalService::log_progress_on`].
    pub async fn log_progress(
        &self,
        exercise: &str,
        quantity: u32,
    ) -> Result<ProgressId, GoalServiceError> {
        self.log_progress_on(exercise, self.today(), quantity).await
    }

    /// Log `quantity` against `exercise` for a given date.
    ///
    /// No goal needs to exist for the exercise.
    ///
    /// # Errors
    ///
    /// Returns `GoalServiceError::Invalid` for a blank exercise name or
    /// `GoalServiceError::Persist` if the write fails.
    pub async fn log_progress_on(
        &self,
        exercise: &str,
        date: NaiveDate,
        quantity: u32,
    ) -> Result<ProgressId, GoalServiceError> {
        let entry =
            NewProgress::new(exercise, date, quantity).map_err(|_| GoalInputError::EmptyName)?;
        let id = self
            .progress
            .add_progress(&entry)
            .await
            .map_err(GoalServiceError::persist("log progress"))?;
        info!(exercise = %entry.exercise, %date, quantity, "progress logged");
        Ok(id)
    }

    /// Complete the active goal for `exercise` once it has reached its target.
    ///
    /// Returns `Ok(false)` when there is no active goal with that name.
    ///
    /// # Errors
    ///
    /// Returns `GoalServiceError::NotReached` below 100%, or
    /// `GoalServiceError::Persist` if the goal cannot be read or updated.
    pub async fn mark_complete(&self, exercise: &str) -> Result<bool, GoalServiceError> {
        let exercise = exercise.trim();
        let Some(goal) = self
            .goals
            .get_goal(exercise)
            .await
            .map_err(GoalServiceError::persist("complete goal"))?
        else {
            return Ok(false);
        };
        if goal.is_completed() {
            return Ok(false);
        }

        let entries = self
            .progress
            .get_progress(exercise)
            .await
            .map_err(GoalServiceError::persist("complete goal"))?;
        let view = GoalProgressView::build(goal, &entries, self.today());
        if !view.reached {
            return Err(GoalServiceError::NotReached {
                exercise: exercise.to_string(),
                percent: view.percent,
            });
        }

        let changed = self
            .goals
            .mark_goal_complete(exercise)
            .await
            .map_err(GoalServiceError::persist("complete goal"))?;
        if changed {
            info!(exercise, "goal completed");
        }
        Ok(changed)
    }

    /// # Errors
    ///
    /// Returns `GoalServiceError::Storage` if the store cannot be read.
    pub async fn get_goal(&self, exercise: &str) -> Result<Option<Goal>, GoalServiceError> {
        Ok(self.goals.get_goal(exercise.trim()).await?)
    }

    /// # Errors
    ///
    /// Returns `GoalServiceError::Storage` if the store cannot be read.
    pub async fn progress_for(&self, exercise: &str) -> Result<Vec<Progress>, GoalServiceError> {
        Ok(self.progress.get_progress(exercise.trim()).await?)
    }

    /// # Errors
    ///
    /// Returns `GoalServiceError::Storage` if the store cannot be read.
    pub async fn active_goals(&self) -> Result<Vec<Goal>, GoalServiceError> {
        Ok(self.goals.get_active_goals().await?)
    }

    /// Snapshot of a single goal for display, active or not.
    ///
    /// Never fails: like [`GoalService::dashboard`], a read error yields a
    /// warning and whatever could still be loaded.
    pub async fn goal_snapshot(&self, exercise: &str) -> GoalSnapshot {
        let exercise = exercise.trim();
        let mut snapshot = GoalSnapshot::default();
        let goal = match self.goals.get_goal(exercise).await {
            Ok(Some(goal)) => goal,
            Ok(None) => return snapshot,
            Err(err) => {
                warn!(exercise, error = %err, "could not load goal");
                snapshot
                    .warnings
                    .push(format!("Could not load goal for {exercise}: {err}"));
                return snapshot;
            }
        };

        let entries = match self.progress.get_progress(goal.exercise()).await {
            Ok(entries) => entries,
            Err(err) => {
                warn!(exercise, error = %err, "could not load progress");
                snapshot
                    .warnings
                    .push(format!("Could not load progress for {exercise}: {err}"));
                Vec::new()
            }
        };
        snapshot.view = Some(GoalProgressView::build(goal, &entries, self.today()));
        snapshot
    }

    /// Flush pending writes.
    ///
    /// # Errors
    ///
    /// Returns `GoalServiceError::Persist` if the flush fails.
    pub async fn save(&self) -> Result<(), GoalServiceError> {
        self.goals
            .save_data()
            .await
            .map_err(GoalServiceError::persist("save data"))
    }

    /// Views for every active goal.
    ///
    /// Never fails: a read error yields an empty section and a warning.
    pub async fn dashboard(&self) -> Dashboard {
        let mut dashboard = Dashboard::default();
        let goals = match self.goals.get_active_goals().await {
            Ok(goals) => goals,
            Err(err) => {
                warn!(error = %err, "could not load active goals");
                dashboard
                    .warnings
                    .push(format!("Could not load goals: {err}"));
                return dashboard;
            }
        };

        let today = self.today();
        for goal in goals {
            let entries = match self.progress.get_progress(goal.exercise()).await {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(exercise = goal.exercise(), error = %err, "could not load progress");
                    dashboard.warnings.push(format!(
                        "Could not load progress for {}: {err}",
                        goal.exercise()
                    ));
                    Vec::new()
                }
            };
            dashboard
                .goals
                .push(GoalProgressView::build(goal, &entries, today));
        }
        debug!(goals = dashboard.goals.len(), "dashboard built");
        dashboard
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use tracker_core::model::{NewGoal, Progress};
    use tracker_core::time::{fixed_clock, fixed_today};

    fn jan(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn push_ups() -> GoalDraft {
        GoalDraft::new("Push-ups", 100, jan(1), 30)
    }

    /// Store whose every call fails as if the database went away.
    struct Unreachable;

    fn down() -> StorageError {
        StorageError::Connection("database is down".into())
    }

    #[async_trait]
    impl GoalRepository for Unreachable {
        async fn add_goal(&self, _goal: &NewGoal) -> Result<GoalId, StorageError> {
            Err(down())
        }
        async fn get_goal(&self, _exercise: &str) -> Result<Option<Goal>, StorageError> {
            Err(down())
        }
        async fn get_active_goals(&self) -> Result<Vec<Goal>, StorageError> {
            Err(down())
        }
        async fn mark_goal_complete(&self, _exercise: &str) -> Result<bool, StorageError> {
            Err(down())
        }
    }

    #[async_trait]
    impl ProgressRepository for Unreachable {
        async fn add_progress(&self, _entry: &NewProgress) -> Result<ProgressId, StorageError> {
            Err(down())
        }
        async fn get_progress(&self, _exercise: &str) -> Result<Vec<Progress>, StorageError> {
            Err(down())
        }
    }

    #[tokio::test]
    async fn invalid_form_is_rejected_with_message() {
        let service = GoalService::in_memory(fixed_clock());
        let err = service
            .set_goal(GoalDraft::new("", 10, jan(1), 30))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Exercise name cannot be empty");
        assert!(service.active_goals().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_active_goal_is_reported() {
        let service = GoalService::in_memory(fixed_clock());
        service.set_goal(push_ups()).await.unwrap();
        let err = service.set_goal(push_ups()).await.unwrap_err();
        assert!(matches!(
            err,
            GoalServiceError::DuplicateActiveGoal { ref exercise } if exercise == "Push-ups"
        ));
    }

    #[tokio::test]
    async fn log_progress_uses_clock_today() {
        let service = GoalService::in_memory(fixed_clock());
        service.log_progress("Push-ups", 25).await.unwrap();
        let entries = service.progress_for("Push-ups").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].date(), fixed_today());
    }

    #[tokio::test]
    async fn blank_exercise_progress_is_invalid() {
        let service = GoalService::in_memory(fixed_clock());
        let err = service.log_progress("  ", 3).await.unwrap_err();
        assert!(matches!(
            err,
            GoalServiceError::Invalid(GoalInputError::EmptyName)
        ));
    }

    #[tokio::test]
    async fn completion_requires_reaching_target() {
        let service = GoalService::in_memory(fixed_clock());
        service.set_goal(push_ups()).await.unwrap();
        service.log_progress_on("Push-ups", jan(2), 40).await.unwrap();

        let err = service.mark_complete("Push-ups").await.unwrap_err();
        assert!(matches!(err, GoalServiceError::NotReached { .. }));
        assert_eq!(service.active_goals().await.unwrap().len(), 1);

        service.log_progress_on("Push-ups", jan(3), 70).await.unwrap();
        assert!(service.mark_complete("Push-ups").await.unwrap());
        assert!(service.active_goals().await.unwrap().is_empty());
        assert!(!service.mark_complete("Push-ups").await.unwrap());
    }

    #[tokio::test]
    async fn completing_unknown_goal_is_noop() {
        let service = GoalService::in_memory(fixed_clock());
        assert!(!service.mark_complete("Lunges").await.unwrap());
    }

    #[tokio::test]
    async fn dashboard_reports_reached_goals() {
        let service = GoalService::in_memory(fixed_clock());
        service.set_goal(push_ups()).await.unwrap();
        service
            .set_goal(GoalDraft::new("Squats", 50, jan(1), 7))
            .await
            .unwrap();
        service.log_progress_on("Push-ups", jan(1), 120).await.unwrap();

        let dashboard = service.dashboard().await;
        assert!(dashboard.warnings.is_empty());
        assert_eq!(dashboard.goals.len(), 2);
        let reached: Vec<&str> = dashboard.reached().map(GoalProgressView::exercise).collect();
        assert_eq!(reached, vec!["Push-ups"]);
    }

    #[tokio::test]
    async fn reads_degrade_to_warnings() {
        let repo = Arc::new(Unreachable);
        let service = GoalService::new(fixed_clock(), repo.clone(), repo);

        let dashboard = service.dashboard().await;
        assert!(dashboard.is_empty());
        assert_eq!(dashboard.warnings.len(), 1);
        assert!(dashboard.warnings[0].contains("database is down"));
    }

    #[tokio::test]
    async fn progress_read_failure_keeps_goal_visible() {
        let storage = Storage::in_memory();
        let service = GoalService::new(
            fixed_clock(),
            Arc::clone(&storage.goals),
            Arc::new(Unreachable),
        );
        service.set_goal(push_ups()).await.unwrap();

        let dashboard = service.dashboard().await;
        assert_eq!(dashboard.goals.len(), 1);
        assert_eq!(dashboard.goals[0].total_done, 0);
        assert_eq!(dashboard.warnings.len(), 1);
    }

    #[tokio::test]
    async fn failed_writes_are_persist_errors() {
        let repo = Arc::new(Unreachable);
        let service = GoalService::new(fixed_clock(), repo.clone(), repo);

        let err = service.set_goal(push_ups()).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to add goal: connection error: database is down"
        );

        let err = service.log_progress("Push-ups", 1).await.unwrap_err();
        assert!(matches!(
            err,
            GoalServiceError::Persist { action: "log progress", .. }
        ));
    }

    #[tokio::test]
    async fn save_is_a_noop_for_immediate_backends() {
        let service = GoalService::in_memory(fixed_clock());
        service.save().await.unwrap();
    }

    #[tokio::test]
    async fn completion_read_failure_is_reported_as_persist() {
        let repo = Arc::new(Unreachable);
        let service = GoalService::new(fixed_clock(), repo.clone(), repo);

        let err = service.mark_complete("Push-ups").await.unwrap_err();
        assert!(matches!(
            err,
            GoalServiceError::Persist {
                action: "complete goal",
                ..
            }
        ));
        assert!(err.to_string().starts_with("failed to complete goal: "));
    }

    #[tokio::test]
    async fn snapshot_includes_completed_goals() {
        let service = GoalService::in_memory(fixed_clock());
        service.set_goal(push_ups()).await.unwrap();
        service.log_progress("Push-ups", 100).await.unwrap();
        assert!(service.mark_complete("Push-ups").await.unwrap());

        let snapshot = service.goal_snapshot(" Push-ups ").await;
        assert!(snapshot.warnings.is_empty());
        let view = snapshot.view.expect("completed goal is still viewable");
        assert!(view.goal.is_completed());
        assert_eq!(view.total_done, 100);
    }

    #[tokio::test]
    async fn snapshot_of_unknown_goal_is_empty() {
        let service = GoalService::in_memory(fixed_clock());
        let snapshot = service.goal_snapshot("Lunges").await;
        assert!(snapshot.view.is_none());
        assert!(snapshot.warnings.is_empty());
    }

    #[tokio::test]
    async fn snapshot_degrades_when_goals_are_unreadable() {
        let repo = Arc::new(Unreachable);
        let service = GoalService::new(fixed_clock(), repo.clone(), repo);

        let snapshot = service.goal_snapshot("Push-ups").await;
        assert!(snapshot.view.is_none());
        assert_eq!(snapshot.warnings.len(), 1);
        assert!(snapshot.warnings[0].contains("database is down"));
    }

    #[tokio::test]
    async fn snapshot_keeps_goal_when_progress_is_unreadable() {
        let storage = Storage::in_memory();
        let service = GoalService::new(
            fixed_clock(),
            Arc::clone(&storage.goals),
            Arc::new(Unreachable),
        );
        service.set_goal(push_ups()).await.unwrap();

        let snapshot = service.goal_snapshot("Push-ups").await;
        let view = snapshot.view.expect("goal still shown");
        assert_eq!(view.total_done, 0);
        assert_eq!(snapshot.warnings.len(), 1);
    }
}
