// Papertrail / SolarWinds: JSON lines in the syslog-ish field layout
use super::common::{format_timestamp, http_severity, json_lines, nested_log, service_label};
use super::{Reconstructor, SerializationError};
use crate::domain::{HttpLogRecord, LogRecord, Metadata};
use crate::filter::{classify, strip_ansi};
use bytes::Bytes;
use serde::Serialize;
use std::borrow::Cow;

#[derive(Debug, Serialize)]
struct PapertrailEvent<'a> {
    timestamp: String,
    hostname: &'a str,
    program: &'a str,
    severity: &'static str,
    message: Cow<'a, str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    log: Option<&'a serde_json::Value>,
    #[serde(rename = "_metadata")]
    metadata: &'a Metadata,
}

fn program<'a>(metadata: &'a Metadata, default: &'a str) -> &'a str {
    metadata
        .get("log_type")
        .map(String::as_str)
        .filter(|value| !value.is_empty())
        .unwrap_or(default)
}

pub struct Papertrail;

impl Reconstructor for Papertrail {
    fn deploy_batch(&self, records: &[LogRecord]) -> Result<Bytes, SerializationError> {
        let events: Vec<PapertrailEvent<'_>> = records
            .iter()
            .map(|record| PapertrailEvent {
                timestamp: format_timestamp(&record.timestamp),
                hostname: service_label(&record.metadata),
                program: program(&record.metadata, "deploy"),
                severity: classify(&record.message, &record.severity).as_str(),
                message: strip_ansi(&record.message),
                status_code: None,
                log: None,
                metadata: &record.metadata,
            })
            .collect();

        json_lines(&events)
    }

    fn http_batch(&self, records: &[HttpLogRecord]) -> Result<Bytes, SerializationError> {
        let events: Vec<PapertrailEvent<'_>> = records
            .iter()
            .map(|record| PapertrailEvent {
                timestamp: format_timestamp(&record.timestamp),
                hostname: service_label(&record.metadata),
                program: program(&record.metadata, "http"),
                severity: http_severity(record.status_code).as_str(),
                message: Cow::Borrowed(record.path.as_str()),
                status_code: Some(record.status_code),
                log: nested_log(&record.log),
                metadata: &record.metadata,
            })
            .collect();

        json_lines(&events)
    }
}
