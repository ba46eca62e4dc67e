use chrono::{DateTime, Duration, Utc};

/// Current instant in UTC.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// The instant `seconds` before `now`, or `None` when that is out of range.
pub fn seconds_before(now: DateTime<Utc>, seconds: u64) -> Option<DateTime<Utc>> {
    let seconds = i64::try_from(seconds).ok()?;
    now.checked_sub_signed(Duration::try_seconds(seconds)?)
}

/// Whole seconds left until `expires_at`, or `0` once it has passed.
pub fn seconds_until(now: DateTime<Utc>, expires_at: DateTime<Utc>) -> u64 {
    u64::try_from((expires_at - now).num_seconds()).unwrap_or(0)
}
