use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::dates::get_date_range;
use crate::model::exercise::ExerciseName;
use crate::model::ids::GoalId;
use crate::stats::calculate_progress;
use crate::validation::{GoalInputError, check_goal_input};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// A persisted goal row violates the model invariants.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GoalError {
    #[error("goal exercise cannot be empty")]
    EmptyExercise,

    #[error("goal target must be > 0")]
    ZeroTarget,

    #[error("goal duration must be > 0")]
    ZeroDuration,
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Raw goal form input, before validation.
///
/// Numbers are signed because a form can submit zero or negative values; the
/// validator is what rejects them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalDraft {
    pub exercise: String,
    pub target: i64,
    pub start_date: NaiveDate,
    pub duration_days: i64,
}

impl GoalDraft {
    #[must_use]
    pub fn new(
        exercise: impl Into<String>,
        target: i64,
        start_date: NaiveDate,
        duration_days: i64,
    ) -> Self {
        Self {
            exercise: exercise.into(),
            target,
            start_date,
            duration_days,
        }
    }

    /// Validate the draft into an insertable goal.
    ///
    /// # Errors
    ///
    /// Returns the first `GoalInputError` in form order.
    pub fn validate(self) -> Result<NewGoal, GoalInputError> {
        check_goal_input(&self.exercise, self.target, self.duration_days)?;
        let exercise = ExerciseName::new(self.exercise).map_err(|_| GoalInputError::EmptyName)?;
        let target = u32::try_from(self.target)
            .map_err(|_| GoalInputError::TargetTooLarge { max: u32::MAX })?;
        let duration_days = u32::try_from(self.duration_days)
            .map_err(|_| GoalInputError::DurationTooLong { max: u32::MAX })?;
        Ok(NewGoal {
            exercise,
            target,
            start_date: self.start_date,
            duration_days,
        })
    }
}

/// A validated goal that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGoal {
    pub exercise: ExerciseName,
    pub target: u32,
    pub start_date: NaiveDate,
    pub duration_days: u32,
}

impl NewGoal {
    /// Build an insertable goal from already-typed values.
    ///
    /// # Errors
    ///
    /// Returns `GoalInputError` if the name is blank or a number is zero.
    pub fn new(
        exercise: impl Into<String>,
        target: u32,
        start_date: NaiveDate,
        duration_days: u32,
    ) -> Result<Self, GoalInputError> {
        GoalDraft::new(
            exercise,
            i64::from(target),
            start_date,
            i64::from(duration_days),
        )
        .validate()
    }

    /// Attach the store-assigned id. New goals always start incomplete.
    #[must_use]
    pub fn assign_id(self, id: GoalId) -> Goal {
        Goal {
            id,
            exercise: self.exercise,
            target: self.target,
            start_date: self.start_date,
            duration_days: self.duration_days,
            completed: false,
        }
    }
}

//
// ─── GOAL ──────────────────────────────────────────────────────────────────────
//

/// A target quantity of an exercise to reach within a window of days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Goal {
    id: GoalId,
    exercise: ExerciseName,
    target: u32,
    start_date: NaiveDate,
    duration_days: u32,
    completed: bool,
}

impl Goal {
    /// Rehydrate a goal from storage.
    ///
    /// # Errors
    ///
    /// Returns `GoalError` if the stored values break the model invariants.
    pub fn from_persisted(
        id: GoalId,
        exercise: impl Into<String>,
        target: u32,
        start_date: NaiveDate,
        duration_days: u32,
        completed: bool,
    ) -> Result<Self, GoalError> {
        let exercise = ExerciseName::new(exercise).map_err(|_| GoalError::EmptyExercise)?;
        if target == 0 {
            return Err(GoalError::ZeroTarget);
        }
        if duration_days == 0 {
            return Err(GoalError::ZeroDuration);
        }
        Ok(Self {
            id,
            exercise,
            target,
            start_date,
            duration_days,
            completed,
        })
    }

    #[must_use]
    pub fn id(&self) -> GoalId {
        self.id
    }

    #[must_use]
    pub fn exercise(&self) -> &str {
        self.exercise.as_str()
    }

    #[must_use]
    pub fn exercise_name(&self) -> &ExerciseName {
        &self.exercise
    }

    #[must_use]
    pub fn target(&self) -> u32 {
        self.target
    }

    #[must_use]
    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    #[must_use]
    pub fn duration_days(&self) -> u32 {
        self.duration_days
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Active goals are the ones still shown for tracking.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.completed
    }

    #[must_use]
    pub fn end_date(&self) -> NaiveDate {
        get_date_range(self.start_date, self.duration_days).1
    }

    /// Percent complete for a given total of logged quantity.
    #[must_use]
    pub fn percent_complete(&self, total_done: u64) -> f64 {
        calculate_progress(total_done, u64::from(self.target))
    }

    /// Set `completed`. Returns `false` if the goal was already complete.
    pub fn mark_completed(&mut self) -> bool {
        if self.completed {
            return false;
        }
        self.completed = true;
        true
    }
}
