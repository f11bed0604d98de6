use super::{BatchSource, SourceError};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Reads one batch per line: each non-blank line is a JSON array of records.
///
/// Empty arrays are skipped so the dispatcher never sees an empty batch.
pub struct JsonLinesSource<R> {
    name: String,
    reader: Box<dyn AsyncBufRead + Unpin + Send>,
    _record: PhantomData<fn() -> R>,
}

impl<R> JsonLinesSource<R> {
    pub fn from_reader<T>(name: impl Into<String>, reader: T) -> Self
    where
        T: AsyncBufRead + Unpin + Send + 'static,
    {
        Self {
            name: name.into(),
            reader: Box::new(reader),
            _record: PhantomData,
        }
    }

    pub fn stdin(name: impl Into<String>) -> Self {
        Self::from_reader(name, BufReader::new(tokio::io::stdin()))
    }

    /// Open `path`, or stdin when `path` is `-`.
    pub async fn open(name: impl Into<String>, path: &Path) -> Result<Self, SourceError> {
        let name = name.into();
        if path.as_os_str() == "-" {
            return Ok(Self::stdin(name));
        }

        match tokio::fs::File::open(path).await {
            Ok(file) => Ok(Self::from_reader(name, BufReader::new(file))),
            Err(error) => Err(SourceError::Io {
                source_name: name,
                error,
            }),
        }
    }
}

impl<R> BatchSource<R> for JsonLinesSource<R>
where
    R: DeserializeOwned + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(self, tx: mpsc::Sender<Vec<R>>, cancel: CancellationToken) -> Result<(), SourceError> {
        let Self { name, reader, .. } = self;
        let mut lines = reader.lines();
        let mut line_number = 0usize;

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(source = %name, "Source cancelled");
                    return Ok(());
                }
                next = lines.next_line() => next,
            };

            let line = match next {
                Ok(Some(line)) => line,
                Ok(None) => {
                    info!(source = %name, lines = line_number, "Source input exhausted");
                    return Ok(());
                }
                Err(error) => {
                    return Err(SourceError::Io {
                        source_name: name,
                        error,
                    });
                }
            };
            line_number += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let batch: Vec<R> = serde_json::from_str(trimmed).map_err(|error| {
                SourceError::MalformedBatch {
                    source_name: name.clone(),
                    line: line_number,
                    error,
                }
            })?;

            if batch.is_empty() {
                continue;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(()),
                sent = tx.send(batch) => {
                    if sent.is_err() {
                        return Err(SourceError::ChannelClosed { source_name: name });
                    }
                }
            }
        }
    }
}
