use chrono::{DateTime, Duration, DurationRound, SecondsFormat, Utc};

/// Truncates an instant to the start of its UTC hour.
///
/// This is the single source of truth for the snapshot bucket key.
pub fn hour_bucket(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant
        .duration_trunc(Duration::hours(1))
        .unwrap_or(instant)
}

/// A dataset is stale when it has never been written, or when more than
/// `interval` has elapsed since the last write.
pub fn is_stale(last: Option<DateTime<Utc>>, now: DateTime<Utc>, interval: Duration) -> bool {
    match last {
        None => true,
        Some(last) => now - last > interval,
    }
}

/// Fixed-width RFC3339 text (`2026-03-01T12:00:00.000000Z`).
///
/// Stored timestamps use this format so that lexical order equals time order.
pub fn to_storage_string(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, true)
}
