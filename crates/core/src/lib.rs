#![forbid(unsafe_code)]

pub mod dates;
pub mod model;
pub mod stats;
pub mod time;
pub mod validation;

pub use dates::{DateParseError, get_date_range, parse_date};
pub use stats::{ChartPoint, calculate_progress, cumulative_series, daily_series, total_quantity};
pub use time::Clock;
pub use validation::{GoalInputError, check_goal_input, validate_input};
