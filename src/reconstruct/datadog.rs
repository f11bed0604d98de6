// Datadog HTTP log intake (v2) array shape
use super::common::{http_severity, json_array, nested_log, service_label};
use super::{Reconstructor, SerializationError};
use crate::domain::{HttpLogRecord, LogRecord, Metadata, SeverityLevel};
use crate::filter::{classify, strip_ansi};
use bytes::Bytes;
use serde::Serialize;
use std::borrow::Cow;

const DD_SOURCE: &str = "railway";

#[derive(Debug, Serialize)]
struct DatadogLog<'a> {
    ddsource: &'static str,
    ddtags: String,
    hostname: &'a str,
    service: &'a str,
    status: &'static str,
    message: Cow<'a, str>,
    timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    http: Option<DatadogHttp<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attributes: Option<&'a serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct DatadogHttp<'a> {
    url_details: UrlDetails<'a>,
    status_code: u16,
}

#[derive(Debug, Serialize)]
struct UrlDetails<'a> {
    path: &'a str,
}

fn status(level: SeverityLevel) -> &'static str {
    match level {
        SeverityLevel::Debug => "debug",
        SeverityLevel::Info => "info",
        SeverityLevel::Warn => "warn",
        SeverityLevel::Error => "error",
        SeverityLevel::Fatal => "critical",
    }
}

/// `key:value` pairs in key order, empty values skipped.
fn ddtags(metadata: &Metadata) -> String {
    metadata
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{key}:{value}"))
        .collect::<Vec<_>>()
        .join(",")
}

pub struct Datadog;

impl Reconstructor for Datadog {
    fn deploy_batch(&self, records: &[LogRecord]) -> Result<Bytes, SerializationError> {
        let logs: Vec<DatadogLog<'_>> = records
            .iter()
            .map(|record| DatadogLog {
                ddsource: DD_SOURCE,
                ddtags: ddtags(&record.metadata),
                hostname: service_label(&record.metadata),
                service: service_label(&record.metadata),
                status: status(classify(&record.message, &record.severity)),
                message: strip_ansi(&record.message),
                timestamp: record.timestamp.timestamp_millis(),
                http: None,
                attributes: None,
            })
            .collect();

        json_array(&logs)
    }

    fn http_batch(&self, records: &[HttpLogRecord]) -> Result<Bytes, SerializationError> {
        let logs: Vec<DatadogLog<'_>> = records
            .iter()
            .map(|record| DatadogLog {
                ddsource: DD_SOURCE,
                ddtags: ddtags(&record.metadata),
                hostname: service_label(&record.metadata),
                service: service_label(&record.metadata),
                status: status(http_severity(record.status_code)),
                message: Cow::Borrowed(record.path.as_str()),
                timestamp: record.timestamp.timestamp_millis(),
                http: Some(DatadogHttp {
                    url_details: UrlDetails { path: &record.path },
                    status_code: record.status_code,
                }),
                attributes: nested_log(&record.log),
            })
            .collect();

        json_array(&logs)
    }
}
