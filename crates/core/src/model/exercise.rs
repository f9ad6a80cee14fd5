use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validated exercise name (trimmed, non-empty).
///
/// Acts as the lookup key shared by goals and progress entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExerciseName(String);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExerciseNameError {
    #[error("Exercise name cannot be empty")]
    Empty,
}

impl ExerciseName {
    /// Create a validated exercise name.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseNameError::Empty` if the name is empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, ExerciseNameError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ExerciseNameError::Empty);
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ExerciseName {
    type Error = ExerciseNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ExerciseName> for String {
    fn from(value: ExerciseName) -> Self {
        value.0
    }
}

impl AsRef<str> for ExerciseName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExerciseName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
