//! Domain layer for rail-log-forwarder.
//!
//! Contains the canonical types shared across all modules:
//! - `LogRecord`: a deploy log line with its metadata
//! - `HttpLogRecord`: an HTTP access log with its nested vendor document
//! - `SeverityLevel`: ordered severity (debug < info < warn < error < fatal)
//! - `ForwarderError`: Top-level error type

pub mod error;
pub mod log_record;
pub mod severity;

pub use error::ForwarderError;
pub use log_record::{HttpLogRecord, LogRecord, Metadata};
pub use severity::SeverityLevel;
