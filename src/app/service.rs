use super::config::RuntimeSettings;
use super::counters::{CountersSnapshot, ProcessedCounters};
use super::dispatcher::{DeployHandler, DispatchSummary, Dispatcher, HttpHandler};
use super::shutdown::cancel_on_signal;
use super::status::StatusReporter;
use crate::collector::{BatchSource, JsonLinesSource, SourceError};
use crate::domain::{ForwarderError, HttpLogRecord, LogRecord};
use crate::sender::{ClientConfig, WebhookSender, build_client};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Dispatchers accept a batch only once the previous one has been taken.
const BATCH_CHANNEL_CAPACITY: usize = 1;

/// What a finished run did, per stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceReport {
    pub deploy: Option<DispatchSummary>,
    pub http: Option<DispatchSummary>,
    pub counters: CountersSnapshot,
}

/// Wires sources, dispatchers and the status reporter around one shared
/// cancellation token.
pub struct ServiceManager {
    settings: RuntimeSettings,
    client_config: ClientConfig,
    counters: ProcessedCounters,
    cancel: CancellationToken,
}

impl ServiceManager {
    pub fn new(settings: RuntimeSettings) -> Self {
        Self {
            settings,
            client_config: ClientConfig::default(),
            counters: ProcessedCounters::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_client_config(mut self, client_config: ClientConfig) -> Self {
        self.client_config = client_config;
        self
    }

    pub fn counters(&self) -> ProcessedCounters {
        self.counters.clone()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Open the configured sources, cancel on SIGINT/SIGTERM, and run until
    /// the sources finish, a signal arrives, or a source fails.
    pub async fn run(self) -> Result<ServiceReport, ForwarderError> {
        let deploy = match &self.settings.deploy_source {
            Some(path) => Some(JsonLinesSource::<LogRecord>::open("deploy", path).await?),
            None => None,
        };
        let http = match &self.settings.http_source {
            Some(path) => Some(JsonLinesSource::<HttpLogRecord>::open("http", path).await?),
            None => None,
        };

        let signals = tokio::spawn(cancel_on_signal(self.cancel.clone()));
        let result = self.run_with_sources(deploy, http).await;
        signals.abort();
        result
    }

    pub async fn run_with_sources<D, H>(
        self,
        deploy: Option<D>,
        http: Option<H>,
    ) -> Result<ServiceReport, ForwarderError>
    where
        D: BatchSource<LogRecord> + 'static,
        H: BatchSource<HttpLogRecord> + 'static,
    {
        let client = build_client(&self.client_config)?;
        let sender = WebhookSender::new(
            client,
            self.settings.webhook_url.clone(),
            self.settings.webhook_mode.config(),
            &self.settings.additional_headers,
        )?;
        let filter = Arc::new(self.settings.filter.clone());

        info!(
            webhook_host = self.settings.webhook_host(),
            webhook_mode = self.settings.webhook_mode.as_str(),
            min_severity = filter.min_severity().as_str(),
            whitelist = ?filter.whitelist_patterns(),
            blacklist = ?filter.blacklist_patterns(),
            deploy_logs_enabled = deploy.is_some(),
            http_logs_enabled = http.is_some(),
            "Log forwarder ready"
        );

        let mut sources = JoinSet::new();
        let deploy_dispatcher = deploy.map(|source| {
            let (tx, rx) = mpsc::channel(BATCH_CHANNEL_CAPACITY);
            spawn_source(&mut sources, source, tx, self.cancel.clone());
            let handler = DeployHandler::new(sender.clone(), filter.clone(), self.counters.clone());
            tokio::spawn(Dispatcher::new(handler, rx, self.cancel.clone()).run())
        });
        let http_dispatcher = http.map(|source| {
            let (tx, rx) = mpsc::channel(BATCH_CHANNEL_CAPACITY);
            spawn_source(&mut sources, source, tx, self.cancel.clone());
            let handler = HttpHandler::new(sender.clone(), self.counters.clone());
            tokio::spawn(Dispatcher::new(handler, rx, self.cancel.clone()).run())
        });

        let reporter = tokio::spawn(
            StatusReporter::new(
                self.counters.clone(),
                self.settings.report_interval,
                self.cancel.clone(),
            )
            .run(),
        );

        let mut first_error: Option<ForwarderError> = None;
        while let Some(joined) = sources.join_next().await {
            let failure = match joined {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => ForwarderError::from(e),
                Err(e) => ForwarderError::from(e),
            };

            error!(error = %failure, "Upstream source failed, shutting down");
            self.cancel.cancel();
            if first_error.is_none() {
                first_error = Some(failure);
            }
        }

        let deploy_summary = join_dispatcher(deploy_dispatcher).await;
        let http_summary = join_dispatcher(http_dispatcher).await;

        self.cancel.cancel();
        if let Err(e) = reporter.await {
            warn!(error = %e, "Status reporter task failed");
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        let report = ServiceReport {
            deploy: deploy_summary?,
            http: http_summary?,
            counters: self.counters.snapshot(),
        };
        info!(
            deploy_logs_processed = report.counters.deploy_logs_processed,
            http_logs_processed = report.counters.http_logs_processed,
            "Log forwarder stopped"
        );
        Ok(report)
    }
}

fn spawn_source<S, R>(
    sources: &mut JoinSet<Result<(), SourceError>>,
    source: S,
    tx: mpsc::Sender<Vec<R>>,
    cancel: CancellationToken,
) where
    S: BatchSource<R> + 'static,
    R: Send + 'static,
{
    info!(source = source.name(), "Starting source");
    sources.spawn(source.run(tx, cancel));
}

async fn join_dispatcher(
    handle: Option<JoinHandle<DispatchSummary>>,
) -> Result<Option<DispatchSummary>, ForwarderError> {
    match handle {
        Some(handle) => Ok(Some(handle.await?)),
        None => Ok(None),
    }
}
