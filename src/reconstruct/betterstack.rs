// Better Stack Logs: array of events keyed by `dt`
use super::common::{format_timestamp, http_severity, json_array};
use super::{Reconstructor, SerializationError};
use crate::domain::{HttpLogRecord, LogRecord, Metadata};
use crate::filter::{classify, strip_ansi};
use bytes::Bytes;
use serde::Serialize;
use std::borrow::Cow;

#[derive(Debug, Serialize)]
struct BetterstackEvent<'a> {
    dt: String,
    message: Cow<'a, str>,
    level: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    log: Option<&'a serde_json::Value>,
    #[serde(rename = "_metadata")]
    metadata: &'a Metadata,
}

pub struct Betterstack;

impl Reconstructor for Betterstack {
    fn deploy_batch(&self, records: &[LogRecord]) -> Result<Bytes, SerializationError> {
        let events: Vec<BetterstackEvent<'_>> = records
            .iter()
            .map(|record| BetterstackEvent {
                dt: format_timestamp(&record.timestamp),
                message: strip_ansi(&record.message),
                level: classify(&record.message, &record.severity).as_str(),
                status_code: None,
                log: None,
                metadata: &record.metadata,
            })
            .collect();

        json_array(&events)
    }

    fn http_batch(&self, records: &[HttpLogRecord]) -> Result<Bytes, SerializationError> {
        let events: Vec<BetterstackEvent<'_>> = records
            .iter()
            .map(|record| BetterstackEvent {
                dt: format_timestamp(&record.timestamp),
                message: Cow::Borrowed(record.path.as_str()),
                level: http_severity(record.status_code).as_str(),
                status_code: Some(record.status_code),
                log: Some(&record.log),
                metadata: &record.metadata,
            })
            .collect();

        json_array(&events)
    }
}
