//! Second-granularity time buckets
//!
//! A bucket is the decimal number `yyyyMMddHHmmss` in UTC, so bucket order
//! matches time order and a TTL deadline is a plain integer comparison.

use chrono::{DateTime, Datelike, NaiveDateTime, TimeDelta, TimeZone, Timelike, Utc};

const BUCKET_FORMAT: &str = "%Y%m%d%H%M%S";

/// Bucket for the given instant.
pub fn second_bucket(at: DateTime<Utc>) -> i64 {
    i64::from(at.year()) * 10_000_000_000
        + i64::from(at.month()) * 100_000_000
        + i64::from(at.day()) * 1_000_000
        + i64::from(at.hour()) * 10_000
        + i64::from(at.minute()) * 100
        + i64::from(at.second())
}

/// Bucket for a unix timestamp in milliseconds.
///
/// Returns `None` when the timestamp is outside chrono's range.
pub fn from_millis(millis: i64) -> Option<i64> {
    DateTime::from_timestamp_millis(millis).map(second_bucket)
}

/// Convert a bucket back into an instant.
pub fn to_datetime(bucket: i64) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(&bucket.to_string(), BUCKET_FORMAT)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Oldest bucket still retained at `now` under a TTL of `ttl_days`.
///
/// Rows whose bucket is strictly below the deadline are expired. A TTL
/// reaching past chrono's range yields 0, which expires nothing.
pub fn expiry_deadline(now: DateTime<Utc>, ttl_days: u32) -> i64 {
    TimeDelta::try_days(i64::from(ttl_days))
        .and_then(|ttl| now.checked_sub_signed(ttl))
        .map_or(0, second_bucket)
        .max(0)
}
