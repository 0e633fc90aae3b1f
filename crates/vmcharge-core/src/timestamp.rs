//! Timestamp parsing
//!
//! History providers report action times without a zone marker; every such
//! value is UTC. Window bounds given on the command line additionally accept
//! bare dates and whole months.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};

use crate::error::{Result, VmchargeError};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a provider timestamp as a UTC instant
///
/// Accepts RFC 3339 with `Z` or an explicit offset, and zone-less
/// `YYYY-MM-DDTHH:MM:SS[.ffffff]` (or with a space separator), which is
/// taken to be UTC.
///
/// # Examples
/// ```
/// use vmcharge_core::timestamp::parse_utc_timestamp;
///
/// let naive = parse_utc_timestamp("2024-03-01T12:00:00.000000").unwrap();
/// let zoned = parse_utc_timestamp("2024-03-01T13:00:00+01:00").unwrap();
/// assert_eq!(naive, zoned);
/// ```
pub fn parse_utc_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| VmchargeError::InvalidTimestamp(format!("'{value}'")))
}

/// Parse a billing window bound
///
/// Anything [`parse_utc_timestamp`] accepts, or a bare `YYYY-MM-DD` date
/// meaning midnight UTC.
pub fn parse_window_bound(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(date) = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d") {
        return Ok(start_of_day(date));
    }

    parse_utc_timestamp(value).map_err(|_| {
        VmchargeError::InvalidDate(format!(
            "Invalid date format '{value}', expected YYYY-MM-DD or an ISO-8601 timestamp"
        ))
    })
}

/// Window covering a whole calendar month given as `YYYY-MM`
///
/// Returns `[first day of month, first day of next month)` in UTC.
pub fn month_window(value: &str) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let (year, month) = value
        .split_once('-')
        .ok_or_else(|| VmchargeError::InvalidDate(format!("Invalid month '{value}', expected YYYY-MM")))?;
    let year = year
        .parse::<i32>()
        .map_err(|_| VmchargeError::InvalidDate(format!("Invalid year in '{value}'")))?;
    let month = month
        .parse::<u32>()
        .map_err(|_| VmchargeError::InvalidDate(format!("Invalid month in '{value}'")))?;

    if !(1..=12).contains(&month) {
        return Err(VmchargeError::InvalidDate(format!(
            "Month must be between 1-12, got {month}"
        )));
    }

    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| VmchargeError::InvalidDate(format!("Invalid date: {value}")))?;
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| VmchargeError::InvalidDate(format!("Invalid date: {value}")))?;

    Ok((start_of_day(first), start_of_day(next)))
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}
