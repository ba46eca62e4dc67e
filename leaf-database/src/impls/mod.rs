pub mod infractions;
pub mod schema;
pub mod tags;

use anyhow::Context as _;
use chrono::{DateTime, NaiveDateTime, Utc};

/// Convert an unsigned Discord snowflake into the signed BIGINT it is stored as.
pub(crate) fn snowflake_to_i64(value: u64, field: &'static str) -> anyhow::Result<i64> {
    i64::try_from(value).with_context(|| format!("{field} out of i64 range"))
}

pub(crate) fn snowflake_from_i64(value: i64, field: &'static str) -> anyhow::Result<u64> {
    u64::try_from(value).with_context(|| format!("{field} row out of u64 range"))
}

/// `TIMESTAMP` columns hold naive UTC wall time.
pub(crate) fn utc(value: NaiveDateTime) -> DateTime<Utc> {
    value.and_utc()
}
