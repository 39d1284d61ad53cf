//! Shared primitive types used across the entire pet core.

use chrono::{DateTime, TimeZone, Utc};

/// Wall-clock instant as persisted: milliseconds since the Unix epoch.
pub type EpochMillis = i64;

/// The canonical session identifier (one per pet / save slot).
pub type SessionId = String;

/// One real-world day in milliseconds.
pub const ONE_DAY_MS: i64 = 24 * 60 * 60 * 1000;

pub fn to_millis(at: DateTime<Utc>) -> EpochMillis {
    at.timestamp_millis()
}

/// Convert persisted millis back to an instant.
/// Returns None for values chrono cannot represent.
pub fn from_millis(ms: EpochMillis) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}
