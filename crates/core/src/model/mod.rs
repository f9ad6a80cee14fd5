mod exercise;
mod goal;
mod ids;
mod progress;

pub use exercise::{ExerciseName, ExerciseNameError};
pub use goal::{Goal, GoalDraft, GoalError, NewGoal};
pub use ids::{GoalId, ProgressId};
pub use progress::{NewProgress, Progress, ProgressError};
