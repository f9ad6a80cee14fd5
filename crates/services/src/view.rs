use chrono::NaiveDate;
use serde::Serialize;

use tracker_core::dates::days_remaining;
use tracker_core::model::{Goal, Progress};
use tracker_core::{ChartPoint, cumulative_series, daily_series, total_quantity};

/// Presentation-agnostic snapshot of one goal and the progress logged against it.
///
/// Holds raw numbers and dates; callers decide how to draw them.
#[derive(Debug, Clone, Serialize)]
pub struct GoalProgressView {
    pub goal: Goal,
    pub total_done: u64,
    pub percent: f64,
    /// True once percent complete reaches 100; completion stays a user action.
    pub reached: bool,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days_remaining: u32,
    pub daily: Vec<ChartPoint>,
    pub cumulative: Vec<ChartPoint>,
}

impl GoalProgressView {
    #[must_use]
    pub fn build(goal: Goal, entries: &[Progress], today: NaiveDate) -> Self {
        let total_done = total_quantity(entries);
        let percent = goal.percent_complete(total_done);
        let end_date = goal.end_date();
        Self {
            start_date: goal.start_date(),
            end_date,
            days_remaining: days_remaining(today, end_date),
            total_done,
            percent,
            reached: percent >= 100.0,
            daily: daily_series(entries),
            cumulative: cumulative_series(entries),
            goal,
        }
    }

    /// `"done/target (pct%)"`, e.g. `"110/100 (100.0%)"`.
    #[must_use]
    pub fn progress_label(&self) -> String {
        format!(
            "{}/{} ({:.1}%)",
            self.total_done,
            self.goal.target(),
            self.percent
        )
    }

    #[must_use]
    pub fn exercise(&self) -> &str {
        self.goal.exercise()
    }
}

/// Everything needed to render the tracking screen.
///
/// Read failures do not abort rendering; they land in `warnings`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Dashboard {
    pub goals: Vec<GoalProgressView>,
    pub warnings: Vec<String>,
}

impl Dashboard {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }

    /// Goals that hit their target and are waiting for the user to complete them.
    pub fn reached(&self) -> impl Iterator<Item = &GoalProgressView> {
        self.goals.iter().filter(|g| g.reached)
    }
}

/// One goal's view plus any read failures hit while building it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GoalSnapshot {
    pub view: Option<GoalProgressView>,
    pub warnings: Vec<String>,
}
