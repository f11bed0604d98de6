use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Record metadata (service_id, service_name, environment_id, ...).
///
/// Kept sorted so every payload built from it serialises identically.
pub type Metadata = BTreeMap<String, String>;

/// A deploy log line as delivered by the upstream subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    /// Explicit severity; may be empty or a value outside the known levels.
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub metadata: Metadata,
}

/// An HTTP access log with its vendor-specific nested document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpLogRecord {
    pub timestamp: DateTime<Utc>,
    pub path: String,
    pub status_code: u16,
    #[serde(default)]
    pub log: serde_json::Value,
    #[serde(default)]
    pub metadata: Metadata,
}

impl LogRecord {
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        non_empty(&self.metadata, key)
    }
}

impl HttpLogRecord {
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        non_empty(&self.metadata, key)
    }
}

fn non_empty<'a>(metadata: &'a Metadata, key: &str) -> Option<&'a str> {
    metadata
        .get(key)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}
