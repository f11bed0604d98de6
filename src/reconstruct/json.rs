// Generic JSON shapes: one array document, or one object per line
use super::common::{format_timestamp, http_severity, json_array, json_lines};
use super::{Reconstructor, SerializationError};
use crate::domain::{HttpLogRecord, LogRecord, Metadata};
use crate::filter::{classify, strip_ansi};
use bytes::Bytes;
use serde::Serialize;
use serde_json::{Map, Value};
use std::borrow::Cow;

#[derive(Debug, Serialize)]
pub struct DeployObject<'a> {
    pub timestamp: String,
    pub message: Cow<'a, str>,
    pub severity: &'a str,
    pub level: &'static str,
    #[serde(rename = "_metadata")]
    pub metadata: &'a Metadata,
}

impl<'a> DeployObject<'a> {
    pub fn from_record(record: &'a LogRecord) -> Self {
        Self {
            timestamp: format_timestamp(&record.timestamp),
            message: strip_ansi(&record.message),
            severity: &record.severity,
            level: classify(&record.message, &record.severity).as_str(),
            metadata: &record.metadata,
        }
    }
}

/// The nested log document's fields with the record's own fields on top.
pub fn http_object(record: &HttpLogRecord) -> Value {
    let mut object = match &record.log {
        Value::Object(fields) => fields.clone(),
        Value::Null => Map::new(),
        other => {
            let mut fields = Map::new();
            fields.insert("log".to_string(), other.clone());
            fields
        }
    };

    object.insert(
        "timestamp".to_string(),
        Value::String(format_timestamp(&record.timestamp)),
    );
    object.insert("path".to_string(), Value::String(record.path.clone()));
    object.insert("status_code".to_string(), Value::from(record.status_code));
    object.insert(
        "level".to_string(),
        Value::String(http_severity(record.status_code).as_str().to_string()),
    );
    object.insert("_metadata".to_string(), metadata_value(&record.metadata));

    Value::Object(object)
}

pub fn metadata_value(metadata: &Metadata) -> Value {
    Value::Object(
        metadata
            .iter()
            .map(|(key, value)| (key.clone(), Value::String(value.clone())))
            .collect(),
    )
}

pub struct JsonArray;

impl Reconstructor for JsonArray {
    fn deploy_batch(&self, records: &[LogRecord]) -> Result<Bytes, SerializationError> {
        let objects: Vec<DeployObject<'_>> = records.iter().map(DeployObject::from_record).collect();
        json_array(&objects)
    }

    fn http_batch(&self, records: &[HttpLogRecord]) -> Result<Bytes, SerializationError> {
        let objects: Vec<Value> = records.iter().map(http_object).collect();
        json_array(&objects)
    }
}

pub struct JsonLines;

impl Reconstructor for JsonLines {
    fn deploy_batch(&self, records: &[LogRecord]) -> Result<Bytes, SerializationError> {
        let objects: Vec<DeployObject<'_>> = records.iter().map(DeployObject::from_record).collect();
        json_lines(&objects)
    }

    fn http_batch(&self, records: &[HttpLogRecord]) -> Result<Bytes, SerializationError> {
        let objects: Vec<Value> = records.iter().map(http_object).collect();
        json_lines(&objects)
    }
}
