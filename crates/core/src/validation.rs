use thiserror::Error;

/// Reasons a goal form submission is rejected.
///
/// The display strings are shown to the user verbatim.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GoalInputError {
    #[error("Exercise name cannot be empty")]
    EmptyName,

    #[error("Target quantity must be greater than 0")]
    NonPositiveTarget,

    #[error("Duration must be greater than 0")]
    NonPositiveDuration,

    #[error("Target quantity must be at most {max}")]
    TargetTooLarge { max: u32 },

    #[error("Duration must be at most {max} days")]
    DurationTooLong { max: u32 },
}

/// Check raw goal inputs in form order: name, then target, then duration.
///
/// A name consisting only of whitespace counts as empty.
///
/// # Errors
///
/// Returns the first `GoalInputError` encountered.
pub fn check_goal_input(
    exercise_name: &str,
    target_quantity: i64,
    duration_days: i64,
) -> Result<(), GoalInputError> {
    if exercise_name.trim().is_empty() {
        return Err(GoalInputError::EmptyName);
    }
    if target_quantity <= 0 {
        return Err(GoalInputError::NonPositiveTarget);
    }
    if duration_days <= 0 {
        return Err(GoalInputError::NonPositiveDuration);
    }
    if u32::try_from(target_quantity).is_err() {
        return Err(GoalInputError::TargetTooLarge { max: u32::MAX });
    }
    if u32::try_from(duration_days).is_err() {
        return Err(GoalInputError::DurationTooLong { max: u32::MAX });
    }
    Ok(())
}

/// Form-facing wrapper around [`check_goal_input`].
///
/// Returns `(true, "")` on success, otherwise `(false, message)`.
#[must_use]
pub fn validate_input(
    exercise_name: &str,
    target_quantity: i64,
    duration_days: i64,
) -> (bool, String) {
    match check_goal_input(exercise_name, target_quantity, duration_days) {
        Ok(()) => (true, String::new()),
        Err(err) => (false, err.to_string()),
    }
}
