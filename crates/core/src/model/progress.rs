use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::model::exercise::{ExerciseName, ExerciseNameError};
use crate::model::ids::ProgressId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error(transparent)]
    Exercise(#[from] ExerciseNameError),
}

/// A progress entry waiting to be stored.
///
/// The exercise is not checked against existing goals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProgress {
    pub exercise: ExerciseName,
    pub date: NaiveDate,
    pub quantity: u32,
}

impl NewProgress {
    /// # Errors
    ///
    /// Returns `ProgressError::Exercise` if the exercise name is blank.
    pub fn new(
        exercise: impl Into<String>,
        date: NaiveDate,
        quantity: u32,
    ) -> Result<Self, ProgressError> {
        Ok(Self {
            exercise: ExerciseName::new(exercise)?,
            date,
            quantity,
        })
    }

    #[must_use]
    pub fn assign_id(self, id: ProgressId) -> Progress {
        Progress {
            id,
            exercise: self.exercise,
            date: self.date,
            quantity: self.quantity,
        }
    }
}

/// A dated quantity logged against an exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Progress {
    id: ProgressId,
    exercise: ExerciseName,
    date: NaiveDate,
    quantity: u32,
}

impl Progress {
    /// Rehydrate a progress row from storage.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if the stored exercise name is blank.
    pub fn from_persisted(
        id: ProgressId,
        exercise: impl Into<String>,
        date: NaiveDate,
        quantity: u32,
    ) -> Result<Self, ProgressError> {
        Ok(NewProgress::new(exercise, date, quantity)?.assign_id(id))
    }

    #[must_use]
    pub fn id(&self) -> ProgressId {
        self.id
    }

    #[must_use]
    pub fn exercise(&self) -> &str {
        self.exercise.as_str()
    }

    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    #[must_use]
    pub fn quantity(&self) -> u32 {
        self.quantity
    }
}
