// Axiom ingest: array of events keyed by `_time`
use super::common::{format_timestamp, http_severity, json_array};
use super::{Reconstructor, SerializationError};
use crate::domain::{HttpLogRecord, LogRecord, Metadata};
use crate::filter::{classify, strip_ansi};
use bytes::Bytes;
use serde::Serialize;
use std::borrow::Cow;

#[derive(Debug, Serialize)]
struct AxiomDeployEvent<'a> {
    #[serde(rename = "_time")]
    time: String,
    message: Cow<'a, str>,
    level: &'static str,
    #[serde(rename = "_metadata")]
    metadata: &'a Metadata,
}

#[derive(Debug, Serialize)]
struct AxiomHttpEvent<'a> {
    #[serde(rename = "_time")]
    time: String,
    path: &'a str,
    status_code: u16,
    level: &'static str,
    log: &'a serde_json::Value,
    #[serde(rename = "_metadata")]
    metadata: &'a Metadata,
}

pub struct Axiom;

impl Reconstructor for Axiom {
    fn deploy_batch(&self, records: &[LogRecord]) -> Result<Bytes, SerializationError> {
        let events: Vec<AxiomDeployEvent<'_>> = records
            .iter()
            .map(|record| AxiomDeployEvent {
                time: format_timestamp(&record.timestamp),
                message: strip_ansi(&record.message),
                level: classify(&record.message, &record.severity).as_str(),
                metadata: &record.metadata,
            })
            .collect();

        json_array(&events)
    }

    fn http_batch(&self, records: &[HttpLogRecord]) -> Result<Bytes, SerializationError> {
        let events: Vec<AxiomHttpEvent<'_>> = records
            .iter()
            .map(|record| AxiomHttpEvent {
                time: format_timestamp(&record.timestamp),
                path: &record.path,
                status_code: record.status_code,
                level: http_severity(record.status_code).as_str(),
                log: &record.log,
                metadata: &record.metadata,
            })
            .collect();

        json_array(&events)
    }
}
