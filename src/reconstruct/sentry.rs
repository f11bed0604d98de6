//! Sentry envelope builder.
//!
//! Each record becomes one envelope triplet: the envelope header, an item
//! header, and the event document. Deploy records become regular events;
//! HTTP records become events carrying one structured log item whose level
//! is derived from the status code.

use super::common::{
    format_timestamp, http_severity, service_label, SOURCE_NAME, SOURCE_VERSION,
};
use super::{Reconstructor, SerializationError};
use crate::domain::{HttpLogRecord, LogRecord, Metadata, SeverityLevel};
use crate::filter::{classify, strip_ansi};
use bytes::Bytes;
use serde_json::{json, Map, Value};

const PLATFORM: &str = "other";
const DEFAULT_ENVIRONMENT: &str = "production";
const DEPLOY_CONTENT_TYPE: &str = "application/json";
const LOG_ITEM_CONTENT_TYPE: &str = "application/vnd.sentry.items.log+json";

// Metadata keys promoted to event tags when present
const TAG_KEYS: [&str; 6] = [
    "project_id",
    "environment_id",
    "service_id",
    "deployment_id",
    "deployment_instance_id",
    "log_type",
];

fn generate_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

pub fn sentry_level(level: SeverityLevel) -> &'static str {
    match level {
        SeverityLevel::Debug => "debug",
        SeverityLevel::Info => "info",
        SeverityLevel::Warn => "warning",
        SeverityLevel::Error => "error",
        SeverityLevel::Fatal => "fatal",
    }
}

/// OpenTelemetry severity number used by Sentry log items.
pub fn severity_number(level: SeverityLevel) -> u8 {
    match level {
        SeverityLevel::Debug => 5,
        SeverityLevel::Info => 9,
        SeverityLevel::Warn => 13,
        SeverityLevel::Error => 17,
        SeverityLevel::Fatal => 21,
    }
}

fn sdk() -> Value {
    json!({ "name": SOURCE_NAME, "version": SOURCE_VERSION })
}

fn environment(metadata: &Metadata) -> &str {
    metadata
        .get("environment_name")
        .map(String::as_str)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_ENVIRONMENT)
}

fn tags(metadata: &Metadata) -> Map<String, Value> {
    TAG_KEYS
        .iter()
        .filter_map(|key| {
            metadata
                .get(*key)
                .filter(|value| !value.is_empty())
                .map(|value| (key.to_string(), Value::String(value.clone())))
        })
        .collect()
}

fn write_line(buffer: &mut Vec<u8>, value: &Value) -> Result<(), SerializationError> {
    serde_json::to_writer(&mut *buffer, value)?;
    buffer.push(b'\n');
    Ok(())
}

fn write_envelope(
    buffer: &mut Vec<u8>,
    event_id: &str,
    sent_at: &str,
    content_type: &str,
    event: &Value,
) -> Result<(), SerializationError> {
    write_line(
        buffer,
        &json!({ "event_id": event_id, "sent_at": sent_at, "sdk": sdk() }),
    )?;
    write_line(
        buffer,
        &json!({ "type": "event", "item_count": 1, "content_type": content_type }),
    )?;
    write_line(buffer, event)
}

fn deploy_event(record: &LogRecord, event_id: &str, timestamp: &str) -> Value {
    let level = classify(&record.message, &record.severity);
    let mut event = json!({
        "event_id": event_id,
        "timestamp": timestamp,
        "level": sentry_level(level),
        "platform": PLATFORM,
        "logger": SOURCE_NAME,
        "message": strip_ansi(&record.message),
        "server_name": service_label(&record.metadata),
        "environment": environment(&record.metadata),
        "sdk": sdk(),
        "tags": tags(&record.metadata),
    });

    // Keep issues from different services in separate groups.
    if let Some(service_id) = record.metadata_value("service_id") {
        event["fingerprint"] = json!(["{{ default }}", service_id]);
    }

    event
}

fn attribute(value: Value, kind: &str) -> Value {
    json!({ "value": value, "type": kind })
}

fn string_attribute(value: &str) -> Value {
    attribute(Value::String(value.to_string()), "string")
}

/// Flatten a JSON document into typed Sentry attributes with dotted keys.
fn flatten_attributes(prefix: &str, value: &Value, out: &mut Map<String, Value>) {
    match value {
        Value::Null => {}
        Value::Object(fields) => {
            for (key, nested) in fields {
                let name = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_attributes(&name, nested, out);
            }
        }
        Value::Bool(flag) => {
            out.insert(prefix.to_string(), attribute(Value::Bool(*flag), "boolean"));
        }
        Value::Number(number) => {
            let kind = if number.is_i64() || number.is_u64() {
                "integer"
            } else {
                "double"
            };
            out.insert(prefix.to_string(), attribute(Value::Number(number.clone()), kind));
        }
        Value::String(text) => {
            out.insert(prefix.to_string(), string_attribute(text));
        }
        Value::Array(_) => {
            out.insert(prefix.to_string(), string_attribute(&value.to_string()));
        }
    }
}

fn http_attributes(record: &HttpLogRecord, level: &str, server_name: &str) -> Map<String, Value> {
    let mut attributes = Map::new();
    attributes.insert("sentry.sdk.name".to_string(), string_attribute(SOURCE_NAME));
    attributes.insert("sentry.sdk.version".to_string(), string_attribute(SOURCE_VERSION));
    attributes.insert("sentry.server.address".to_string(), string_attribute(server_name));
    attributes.insert("level".to_string(), string_attribute(level));

    let prefix = if record.log.is_object() { "" } else { "log" };
    flatten_attributes(prefix, &record.log, &mut attributes);

    for (key, value) in &record.metadata {
        attributes.insert(format!("_metadata__{key}"), string_attribute(value));
    }

    attributes
}

fn http_event(record: &HttpLogRecord, event_id: &str, timestamp: &str) -> Value {
    let severity = http_severity(record.status_code);
    let level = sentry_level(severity);
    let server_name = service_label(&record.metadata);

    let item = json!({
        "timestamp": timestamp,
        "trace_id": generate_id(),
        "level": level,
        "severity_number": severity_number(severity),
        "body": record.path,
        "attributes": http_attributes(record, level, server_name),
    });

    json!({
        "event_id": event_id,
        "timestamp": timestamp,
        "level": level,
        "platform": PLATFORM,
        "server_name": server_name,
        "environment": environment(&record.metadata),
        "sdk": sdk(),
        "items": [item],
    })
}

pub struct Sentry;

impl Reconstructor for Sentry {
    fn deploy_batch(&self, records: &[LogRecord]) -> Result<Bytes, SerializationError> {
        let mut buffer = Vec::new();

        for record in records {
            let event_id = generate_id();
            let timestamp = format_timestamp(&record.timestamp);
            let event = deploy_event(record, &event_id, &timestamp);
            write_envelope(&mut buffer, &event_id, &timestamp, DEPLOY_CONTENT_TYPE, &event)?;
        }

        Ok(Bytes::from(buffer))
    }

    fn http_batch(&self, records: &[HttpLogRecord]) -> Result<Bytes, SerializationError> {
        let mut buffer = Vec::new();

        for record in records {
            let event_id = generate_id();
            let timestamp = format_timestamp(&record.timestamp);
            let event = http_event(record, &event_id, &timestamp);
            write_envelope(&mut buffer, &event_id, &timestamp, LOG_ITEM_CONTENT_TYPE, &event)?;
        }

        Ok(Bytes::from(buffer))
    }
}
