//! Human date-string and snooze-duration parsing for CLI input.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

/// Errors from parsing user-supplied dates and durations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateParseError {
    /// The date string matched none of the accepted formats.
    #[error("unrecognized date '{0}'; try '2025-05-10 14:00', '2025-05-10', or 'tomorrow'")]
    UnrecognizedDate(String),
    /// The duration string carried no usable components.
    #[error("no valid duration in '{0}'; use a format like 1d, 2h, 30m, or 1d2h30m")]
    InvalidDuration(String),
}

/// Accepted date-time formats, tried in order. Times are local.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S", "%m/%d/%Y %H:%M"];

/// Accepted date-only formats (midnight local time).
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Parses a human date string into a UTC timestamp.
///
/// Accepts `today`/`tomorrow`, RFC 3339, and the common `Y-m-d` / `m/d/Y`
/// forms with optional times (interpreted in the local timezone).
///
/// # Errors
///
/// Returns [`DateParseError::UnrecognizedDate`] when no format matches.
pub fn parse_date(input: &str) -> Result<DateTime<Utc>, DateParseError> {
    let trimmed = input.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "today" => return Ok(Utc::now()),
        "tomorrow" => return Ok(Utc::now() + Duration::days(1)),
        _ => {}
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            if let Some(dt) = local_to_utc(naive) {
                return Ok(dt);
            }
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            if let Some(dt) = date.and_hms_opt(0, 0, 0).and_then(local_to_utc) {
                return Ok(dt);
            }
        }
    }
    Err(DateParseError::UnrecognizedDate(input.to_string()))
}

/// Parses a snooze duration like `1d2h30m` into `(days, hours, minutes)`.
///
/// Any subset of components is accepted, but at least one must be present
/// and non-zero.
///
/// # Errors
///
/// Returns [`DateParseError::InvalidDuration`] on stray characters,
/// trailing digits, or an all-zero duration.
pub fn parse_duration(input: &str) -> Result<(i64, i64, i64), DateParseError> {
    let invalid = || DateParseError::InvalidDuration(input.to_string());
    let mut days = 0i64;
    let mut hours = 0i64;
    let mut minutes = 0i64;
    let mut digits = String::new();

    for c in input.trim().chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let value: i64 = digits.parse().map_err(|_| invalid())?;
        match c {
            'd' => days += value,
            'h' => hours += value,
            'm' => minutes += value,
            _ => return Err(invalid()),
        }
        digits.clear();
    }
    if !digits.is_empty() || (days == 0 && hours == 0 && minutes == 0) {
        return Err(invalid());
    }
    Ok((days, hours, minutes))
}

fn local_to_utc(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}
