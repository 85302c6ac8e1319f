//! Timestamp parsing and elapsed-day arithmetic. All times are UTC.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

pub const MILLIS_PER_DAY: i64 = 86_400_000;

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses a platform timestamp. Zone-less timestamps and bare dates are read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parses a calendar date (`YYYY-MM-DD`), ignoring any time component.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(trimmed).map(|dt| dt.date_naive()))
}

/// Whole days elapsed since `timestamp`, floored. Negative for future timestamps.
pub fn days_ago(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    now.signed_duration_since(timestamp)
        .num_milliseconds()
        .div_euclid(MILLIS_PER_DAY)
}

pub fn days_ago_raw(raw: &str, now: DateTime<Utc>) -> Option<i64> {
    parse_timestamp(raw).map(|timestamp| days_ago(timestamp, now))
}

/// Orders two optional timestamps, undated values last either way.
pub fn cmp_undated_last(
    a: Option<DateTime<Utc>>,
    b: Option<DateTime<Utc>>,
    newest_first: bool,
) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) if newest_first => b.cmp(&a),
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
