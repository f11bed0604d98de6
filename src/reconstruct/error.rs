use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("JSON serialization failed: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Batch is empty")]
    EmptyBatch,
    #[error("Timestamp out of range for nanosecond precision: {0}")]
    TimestampOutOfRange(DateTime<Utc>),
}
