//! General time utility functions

use chrono::{DateTime, Utc};

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

/// Signed number of seconds from `earlier` to `later`.
///
/// Negative if `later` is actually before `earlier`, `None` if the difference
/// cannot be represented in nanoseconds.
pub fn seconds_between(earlier: &DateTime<Utc>, later: &DateTime<Utc>) -> Option<f64> {
    duration_to_seconds(later.signed_duration_since(*earlier))
}
