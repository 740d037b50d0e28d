//! Utility modules.

pub mod datetime;

pub use datetime::{epoch_seconds, format_timestamp, parse_timestamp, timestamp_from_epoch_seconds};
