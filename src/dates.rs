//! Date arithmetic and rendering for Gmail search queries.

use chrono::{Days, NaiveDate};

use crate::error::DateError;

/// Returns the date `days_ago` days before `anchor`.
///
/// `days_ago` must be at least 1 and `anchor` must be present.
pub fn previous_date(anchor: Option<NaiveDate>, days_ago: i64) -> Result<NaiveDate, DateError> {
    let anchor = require_anchor(anchor)?;
    let days = require_positive("days_ago", days_ago)?;

    anchor
        .checked_sub_days(days)
        .ok_or_else(|| DateError::InvalidArgument(format!("{anchor} minus {days_ago} days is out of range")))
}

/// Returns the date `days_ahead` days after `anchor`.
///
/// `days_ahead` must be at least 1 and `anchor` must be present.
pub fn future_date(anchor: Option<NaiveDate>, days_ahead: i64) -> Result<NaiveDate, DateError> {
    let anchor = require_anchor(anchor)?;
    let days = require_positive("days_ahead", days_ahead)?;

    anchor
        .checked_add_days(days)
        .ok_or_else(|| DateError::InvalidArgument(format!("{anchor} plus {days_ahead} days is out of range")))
}

/// Renders a date in Gmail's `after:`/`before:` syntax, `YYYY/MM/DD`.
pub fn query_format(date: Option<NaiveDate>) -> Result<String, DateError> {
    let date = require_anchor(date)?;
    Ok(date.format("%Y/%m/%d").to_string())
}

fn require_anchor(anchor: Option<NaiveDate>) -> Result<NaiveDate, DateError> {
    anchor.ok_or_else(|| DateError::InvalidArgument("invalid date object given".to_string()))
}

fn require_positive(name: &str, value: i64) -> Result<Days, DateError> {
    if value < 1 {
        return Err(DateError::InvalidArgument(format!(
            "invalid value for `{name}`: must be greater than 0, got {value}"
        )));
    }
    Ok(Days::new(value as u64))
}

/// Inclusive start / exclusive end of a search, as Gmail interprets
/// `after:` and `before:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SearchWindow {
    /// Window covering `window_days` calendar days, the last one being `anchor`.
    pub fn ending_on(anchor: NaiveDate, window_days: i64) -> Result<Self, DateError> {
        let start = match window_days {
            n if n < 1 => {
                return Err(DateError::InvalidArgument(format!(
                    "invalid value for `window_days`: must be greater than 0, got {n}"
                )));
            }
            1 => anchor,
            n => previous_date(Some(anchor), n - 1)?,
        };
        let end = future_date(Some(anchor), 1)?;
        Ok(Self { start, end })
    }

    pub fn after(&self) -> Result<String, DateError> {
        query_format(Some(self.start))
    }

    pub fn before(&self) -> Result<String, DateError> {
        query_format(Some(self.end))
    }
}
