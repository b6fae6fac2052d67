//! years.rs
//!
//! GitHub's `contributionsCollection` only accepts a window of at most one
//! year, so lifetime totals have to be summed one calendar year at a time.
//! These helpers produce the years to visit and the window bounds for each.

use std::ops::RangeInclusive;

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike};

/// Every calendar year from account creation through `current_year`.
///
/// Empty when the creation year lies in the future (clock skew).
pub fn contribution_years(created_year: i32, current_year: i32) -> RangeInclusive<i32> {
    created_year..=current_year
}

/// The `from`/`to` bounds of one calendar year, in the `DateTime` format the
/// GraphQL API expects.
pub fn year_window(year: i32) -> (String, String) {
    (
        format!("{year:04}-01-01T00:00:00Z"),
        format!("{year:04}-12-31T23:59:59Z"),
    )
}

/// Year component of an RFC 3339 timestamp such as `2014-03-08T17:02:21Z`.
pub fn year_of(timestamp: &str) -> Result<i32> {
    let parsed = DateTime::parse_from_rfc3339(timestamp)
        .with_context(|| format!("invalid timestamp {timestamp:?}"))?;
    Ok(parsed.year())
}
