// Helpers shared by the vendor payload builders
use super::SerializationError;
use crate::domain::{Metadata, SeverityLevel};
use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

pub const SOURCE_NAME: &str = env!("CARGO_PKG_NAME");
pub const SOURCE_VERSION: &str = env!("CARGO_PKG_VERSION");

// Rough per-record size used to pre-size output buffers
const ESTIMATED_ENTRY_SIZE: usize = 512;

pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub fn unix_nanos(timestamp: &DateTime<Utc>) -> Result<i64, SerializationError> {
    timestamp
        .timestamp_nanos_opt()
        .ok_or(SerializationError::TimestampOutOfRange(*timestamp))
}

/// Fixed status-code policy for HTTP records.
pub fn http_severity(status_code: u16) -> SeverityLevel {
    match status_code {
        500..=599 => SeverityLevel::Error,
        400..=499 => SeverityLevel::Warn,
        _ => SeverityLevel::Info,
    }
}

/// service_name, then service_id, then "unknown".
pub fn service_label(metadata: &Metadata) -> &str {
    ["service_name", "service_id"]
        .iter()
        .find_map(|key| metadata.get(*key).filter(|value| !value.is_empty()))
        .map_or("unknown", String::as_str)
}

/// The nested log document, or `None` when the record carries none.
pub fn nested_log(log: &serde_json::Value) -> Option<&serde_json::Value> {
    (!log.is_null()).then_some(log)
}

pub fn json_array<T: Serialize>(items: &[T]) -> Result<Bytes, SerializationError> {
    let mut buffer = Vec::with_capacity(items.len().saturating_mul(ESTIMATED_ENTRY_SIZE));
    serde_json::to_writer(&mut buffer, items)?;
    Ok(Bytes::from(buffer))
}

pub fn json_lines<T: Serialize>(items: &[T]) -> Result<Bytes, SerializationError> {
    let mut buffer = Vec::with_capacity(items.len().saturating_mul(ESTIMATED_ENTRY_SIZE));
    for item in items {
        serde_json::to_writer(&mut buffer, item)?;
        buffer.push(b'\n');
    }
    Ok(Bytes::from(buffer))
}
