//! Upstream boundary.
//!
//! A [`BatchSource`] produces ordered batches of records for one stream and
//! pushes them into that stream's dispatcher channel. Sources stop when the
//! shared cancellation token fires or their input ends; any other failure is
//! returned and brings the whole forwarder down.

pub mod jsonl;

pub use jsonl::JsonLinesSource;

use std::future::Future;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("{source_name}: failed to read input: {error}")]
    Io {
        source_name: String,
        #[source]
        error: std::io::Error,
    },
    #[error("{source_name}: malformed batch on line {line}: {error}")]
    MalformedBatch {
        source_name: String,
        line: usize,
        #[source]
        error: serde_json::Error,
    },
    #[error("{source_name}: dispatcher channel closed")]
    ChannelClosed { source_name: String },
}

pub trait BatchSource<R>: Send {
    fn name(&self) -> &str;

    fn run(
        self,
        tx: mpsc::Sender<Vec<R>>,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<(), SourceError>> + Send;
}
