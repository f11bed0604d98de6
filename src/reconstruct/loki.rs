// Grafana Loki push API: records grouped into label-keyed streams
use super::common::unix_nanos;
use super::json::http_object;
use super::{Reconstructor, SerializationError};
use crate::domain::{HttpLogRecord, LogRecord, Metadata};
use crate::filter::{classify, strip_ansi};
use bytes::Bytes;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

type Labels = BTreeMap<String, String>;

#[derive(Debug, Serialize)]
struct PushRequest {
    streams: Vec<Stream>,
}

#[derive(Debug, Serialize)]
struct Stream {
    stream: Labels,
    values: Vec<[String; 2]>,
}

/// Groups entries by label set, keeping streams in first-seen order.
#[derive(Default)]
struct StreamGrouper {
    streams: Vec<Stream>,
    index: HashMap<Labels, usize>,
}

impl StreamGrouper {
    fn push(&mut self, labels: Labels, nanos: i64, line: String) {
        let value = [nanos.to_string(), line];
        match self.index.get(&labels) {
            Some(&position) => self.streams[position].values.push(value),
            None => {
                self.index.insert(labels.clone(), self.streams.len());
                self.streams.push(Stream {
                    stream: labels,
                    values: vec![value],
                });
            }
        }
    }

    fn finish(self) -> Result<Bytes, SerializationError> {
        let request = PushRequest {
            streams: self.streams,
        };
        Ok(Bytes::from(serde_json::to_vec(&request)?))
    }
}

fn labels(metadata: &Metadata, extra_key: &str, extra_value: String) -> Labels {
    let mut labels: Labels = metadata
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    labels.insert(extra_key.to_string(), extra_value);
    labels
}

pub struct Loki;

impl Reconstructor for Loki {
    fn deploy_batch(&self, records: &[LogRecord]) -> Result<Bytes, SerializationError> {
        let mut grouper = StreamGrouper::default();

        for record in records {
            let level = classify(&record.message, &record.severity);
            grouper.push(
                labels(&record.metadata, "level", level.as_str().to_string()),
                unix_nanos(&record.timestamp)?,
                strip_ansi(&record.message).into_owned(),
            );
        }

        grouper.finish()
    }

    fn http_batch(&self, records: &[HttpLogRecord]) -> Result<Bytes, SerializationError> {
        let mut grouper = StreamGrouper::default();

        for record in records {
            grouper.push(
                labels(&record.metadata, "status_code", record.status_code.to_string()),
                unix_nanos(&record.timestamp)?,
                serde_json::to_string(&http_object(record))?,
            );
        }

        grouper.finish()
    }
}
