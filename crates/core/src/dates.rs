use chrono::{Days, NaiveDate};
use thiserror::Error;

/// Format used for dates entered on the command line and in forms.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid date {raw:?}: expected YYYY-MM-DD")]
pub struct DateParseError {
    raw: String,
}

impl DateParseError {
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

/// Parse a `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns `DateParseError` if the text is not a valid calendar date.
pub fn parse_date(text: &str) -> Result<NaiveDate, DateParseError> {
    let trimmed = text.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| DateParseError {
        raw: trimmed.to_owned(),
    })
}

/// Returns the `(start, end)` window for a goal, where `end` is
/// `duration_days` calendar days after `start`.
///
/// The end date saturates at `NaiveDate::MAX`.
#[must_use]
pub fn get_date_range(start_date: NaiveDate, duration_days: u32) -> (NaiveDate, NaiveDate) {
    let end = start_date
        .checked_add_days(Days::new(u64::from(duration_days)))
        .unwrap_or(NaiveDate::MAX);
    (start_date, end)
}

/// Days left until `end`, counted from `today`; zero once the window has passed.
#[must_use]
pub fn days_remaining(today: NaiveDate, end: NaiveDate) -> u32 {
    let days = (end - today).num_days();
    u32::try_from(days.max(0)).unwrap_or(u32::MAX)
}
