use super::counters::ProcessedCounters;
use crate::domain::{HttpLogRecord, LogRecord};
use crate::filter::FilterSettings;
use crate::sender::WebhookSender;
use std::future::Future;
use std::ops::AddAssign;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    /// Waiting for the next batch or cancellation.
    Idle,
    /// Processing one batch.
    Draining,
    /// Terminal.
    Stopped,
}

/// Per-batch accounting returned by a handler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub received: usize,
    pub kept: usize,
    pub delivered: usize,
    pub failed: usize,
}

impl AddAssign for BatchOutcome {
    fn add_assign(&mut self, other: Self) {
        self.received += other.received;
        self.kept += other.kept;
        self.delivered += other.delivered;
        self.failed += other.failed;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub batches: usize,
    pub totals: BatchOutcome,
}

/// The stream-specific half of a dispatcher: what to do with one batch.
/// Failures are handled inside; a handler never stops its dispatcher.
pub trait StreamHandler: Send + Sync + 'static {
    type Record: Send + 'static;

    fn stream(&self) -> &'static str;

    fn handle(&self, batch: Vec<Self::Record>) -> impl Future<Output = BatchOutcome> + Send;
}

/// Single consumer of one stream's batch channel.
pub struct Dispatcher<H: StreamHandler> {
    handler: H,
    batches: mpsc::Receiver<Vec<H::Record>>,
    cancel: CancellationToken,
    state: watch::Sender<DispatcherState>,
}

impl<H: StreamHandler> Dispatcher<H> {
    pub fn new(
        handler: H,
        batches: mpsc::Receiver<Vec<H::Record>>,
        cancel: CancellationToken,
    ) -> Self {
        let (state, _) = watch::channel(DispatcherState::Idle);
        Self {
            handler,
            batches,
            cancel,
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<DispatcherState> {
        self.state.subscribe()
    }

    /// Process batches in arrival order until cancelled or the channel closes.
    /// A batch already being drained is finished; queued ones are abandoned.
    pub async fn run(mut self) -> DispatchSummary {
        let stream = self.handler.stream();
        let mut summary = DispatchSummary::default();
        info!(stream, "Dispatcher started");

        loop {
            self.state.send_replace(DispatcherState::Idle);

            let batch = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!(stream, "Dispatcher cancelled");
                    break;
                }
                batch = self.batches.recv() => match batch {
                    Some(batch) => batch,
                    None => {
                        debug!(stream, "Batch channel closed");
                        break;
                    }
                },
            };

            self.state.send_replace(DispatcherState::Draining);
            let outcome = self.handler.handle(batch).await;
            debug!(
                stream,
                received = outcome.received,
                kept = outcome.kept,
                delivered = outcome.delivered,
                failed = outcome.failed,
                "Batch processed"
            );

            summary.batches += 1;
            summary.totals += outcome;
        }

        self.state.send_replace(DispatcherState::Stopped);
        info!(
            stream,
            batches = summary.batches,
            delivered = summary.totals.delivered,
            failed = summary.totals.failed,
            "Dispatcher stopped"
        );
        summary
    }
}

/// Deploy logs: filter, then one webhook call per surviving record.
pub struct DeployHandler {
    sender: WebhookSender,
    filter: Arc<FilterSettings>,
    counters: ProcessedCounters,
}

impl DeployHandler {
    pub fn new(
        sender: WebhookSender,
        filter: Arc<FilterSettings>,
        counters: ProcessedCounters,
    ) -> Self {
        Self {
            sender,
            filter,
            counters,
        }
    }

    async fn deliver(&self, record: &LogRecord) -> bool {
        let stream = self.stream();
        let payload = match self
            .sender
            .mode()
            .reconstruct_deploy(std::slice::from_ref(record))
        {
            Ok(payload) => payload,
            Err(e) => {
                error!(
                    stream,
                    error = %e,
                    message = %record.message,
                    "Failed to reconstruct deploy log"
                );
                return false;
            }
        };

        match self.sender.post(payload.clone()).await {
            Ok(_) => true,
            Err(e) => {
                error!(
                    stream,
                    error = %e,
                    serialized_logs = %String::from_utf8_lossy(&payload),
                    "Failed to deliver deploy log"
                );
                false
            }
        }
    }
}

impl StreamHandler for DeployHandler {
    type Record = LogRecord;

    fn stream(&self) -> &'static str {
        "deploy"
    }

    async fn handle(&self, batch: Vec<LogRecord>) -> BatchOutcome {
        let received = batch.len();
        let kept = self.filter.retain(batch);
        let mut outcome = BatchOutcome {
            received,
            kept: kept.len(),
            ..BatchOutcome::default()
        };

        for record in &kept {
            if self.deliver(record).await {
                outcome.delivered += 1;
            } else {
                outcome.failed += 1;
            }
        }

        self.counters.add_deploy(outcome.delivered as u64);
        outcome
    }
}

/// HTTP logs: the whole batch in one webhook call.
pub struct HttpHandler {
    sender: WebhookSender,
    counters: ProcessedCounters,
}

impl HttpHandler {
    pub fn new(sender: WebhookSender, counters: ProcessedCounters) -> Self {
        Self { sender, counters }
    }
}

impl StreamHandler for HttpHandler {
    type Record = HttpLogRecord;

    fn stream(&self) -> &'static str {
        "http"
    }

    async fn handle(&self, batch: Vec<HttpLogRecord>) -> BatchOutcome {
        let stream = self.stream();
        let received = batch.len();
        let mut outcome = BatchOutcome {
            received,
            kept: received,
            ..BatchOutcome::default()
        };
        if batch.is_empty() {
            return outcome;
        }

        let payload = match self.sender.mode().reconstruct_http(&batch) {
            Ok(payload) => payload,
            Err(e) => {
                error!(
                    stream,
                    error = %e,
                    records = received,
                    "Failed to reconstruct http logs"
                );
                outcome.failed = received;
                return outcome;
            }
        };

        match self.sender.post(payload.clone()).await {
            Ok(_) => {
                outcome.delivered = received;
                self.counters.add_http(received as u64);
            }
            Err(e) => {
                error!(
                    stream,
                    error = %e,
                    serialized_logs = %String::from_utf8_lossy(&payload),
                    "Failed to deliver http logs"
                );
                outcome.failed = received;
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Records what it sees; optionally parks until released.
    #[derive(Clone, Default)]
    struct RecordingHandler {
        seen: Arc<Mutex<Vec<Vec<u32>>>>,
        gate: Option<Arc<Notify>>,
    }

    impl StreamHandler for RecordingHandler {
        type Record = u32;

        fn stream(&self) -> &'static str {
            "test"
        }

        async fn handle(&self, batch: Vec<u32>) -> BatchOutcome {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            let received = batch.len();
            self.seen.lock().push(batch);
            BatchOutcome {
                received,
                kept: received,
                delivered: received,
                failed: 0,
            }
        }
    }

    #[tokio::test]
    async fn test_batches_processed_in_order_until_channel_closes() {
        let handler = RecordingHandler::default();
        let seen = handler.seen.clone();
        let (tx, rx) = mpsc::channel(1);
        let dispatcher = Dispatcher::new(handler, rx, CancellationToken::new());
        let state = dispatcher.subscribe();
        let task = tokio::spawn(dispatcher.run());

        tx.send(vec![1, 2]).await.unwrap();
        tx.send(vec![3]).await.unwrap();
        tx.send(vec![4, 5, 6]).await.unwrap();
        drop(tx);

        let summary = task.await.unwrap();
        assert_eq!(summary.batches, 3);
        assert_eq!(summary.totals.delivered, 6);
        assert_eq!(*seen.lock(), vec![vec![1, 2], vec![3], vec![4, 5, 6]]);
        assert_eq!(*state.borrow(), DispatcherState::Stopped);
    }

    #[tokio::test]
    async fn test_cancellation_stops_idle_dispatcher() {
        let (_tx, rx) = mpsc::channel::<Vec<u32>>(1);
        let cancel = CancellationToken::new();
        let dispatcher = Dispatcher::new(RecordingHandler::default(), rx, cancel.clone());
        let task = tokio::spawn(dispatcher.run());

        cancel.cancel();
        let summary = tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(summary.batches, 0);
    }

    #[tokio::test]
    async fn test_in_flight_batch_finishes_and_queued_batch_is_abandoned() {
        let gate = Arc::new(Notify::new());
        let handler = RecordingHandler {
            gate: Some(gate.clone()),
            ..RecordingHandler::default()
        };
        let seen = handler.seen.clone();
        let (tx, rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        let dispatcher = Dispatcher::new(handler, rx, cancel.clone());
        let mut state = dispatcher.subscribe();
        let task = tokio::spawn(dispatcher.run());

        tx.send(vec![1]).await.unwrap();
        state
            .wait_for(|state| *state == DispatcherState::Draining)
            .await
            .unwrap();
        tx.send(vec![2]).await.unwrap();

        cancel.cancel();
        gate.notify_one();

        let summary = task.await.unwrap();
        assert_eq!(summary.batches, 1);
        assert_eq!(*seen.lock(), vec![vec![1]]);
    }

    #[test]
    fn test_outcome_accumulates() {
        let mut total = BatchOutcome::default();
        total += BatchOutcome {
            received: 3,
            kept: 2,
            delivered: 1,
            failed: 1,
        };
        total += BatchOutcome {
            received: 1,
            kept: 1,
            delivered: 1,
            failed: 0,
        };
        assert_eq!(
            total,
            BatchOutcome {
                received: 4,
                kept: 3,
                delivered: 2,
                failed: 1,
            }
        );
    }
}
