//! Epoch-seconds and RFC 3339 conversions for timestamp values.
//!
//! Timestamps are always UTC. Conversions to epoch seconds truncate any
//! sub-second part.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::CodecError;

/// Converts Unix epoch seconds to a UTC timestamp.
pub fn timestamp_from_epoch_seconds(secs: i64) -> Result<DateTime<Utc>, CodecError> {
    DateTime::<Utc>::from_timestamp(secs, 0).ok_or_else(|| CodecError::Overflow {
        value: secs.to_string(),
        target: "timestamp".to_string(),
    })
}

/// Returns the Unix epoch seconds of a timestamp, rounding toward negative infinity.
pub fn epoch_seconds(ts: &DateTime<Utc>) -> i64 {
    ts.timestamp()
}

/// Formats a timestamp as RFC 3339 with a `Z` suffix.
///
/// Sub-second precision is kept only when present.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parses an RFC 3339 timestamp with any offset into UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, CodecError> {
    DateTime::parse_from_rfc3339(s)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| CodecError::Conversion {
            from: format!("string {:?}", s),
            to: "timestamp".to_string(),
            reason: e.to_string(),
        })
}
