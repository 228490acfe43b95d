//! Utility functions for the team-formation service

use chrono::{DateTime, Utc};
use std::time::Duration;
use uuid::Uuid;

/// Generate a new unique formation pass ID
pub fn generate_pass_id() -> Uuid {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Elapsed time between `since` and `now`, clamped at zero when `since` is in the future
pub fn elapsed_between(since: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    now.signed_duration_since(since)
        .to_std()
        .unwrap_or(Duration::ZERO)
}

/// Difference between the largest and smallest value, 0 for an empty input
///
/// Returned unsigned so the full `i64` range never overflows.
pub fn spread<I>(values: I) -> u64
where
    I: IntoIterator<Item = i64>,
{
    let mut bounds: Option<(i64, i64)> = None;
    for value in values {
        bounds = Some(match bounds {
            Some((min, max)) => (min.min(value), max.max(value)),
            None => (value, value),
        });
    }
    bounds.map(|(min, max)| max.abs_diff(min)).unwrap_or(0)
}
