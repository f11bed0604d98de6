use super::counters::{CountersSnapshot, ProcessedCounters};
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Logs the processed counters on a fixed interval.
pub struct StatusReporter {
    counters: ProcessedCounters,
    every: Duration,
    cancel: CancellationToken,
}

impl StatusReporter {
    pub fn new(counters: ProcessedCounters, every: Duration, cancel: CancellationToken) -> Self {
        Self {
            counters,
            every,
            cancel,
        }
    }

    /// Runs until cancelled and returns the number of reports emitted.
    pub async fn run(self) -> u64 {
        let mut ticker = interval(self.every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        let mut reports = 0;
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {
                    report(self.counters.snapshot());
                    reports += 1;
                }
            }
        }
        reports
    }
}

fn report(snapshot: CountersSnapshot) {
    info!(
        deploy_logs_processed = snapshot.deploy_logs_processed,
        http_logs_processed = snapshot.http_logs_processed,
        "Status report"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_reports_on_interval_until_cancelled() {
        let cancel = CancellationToken::new();
        let reporter = StatusReporter::new(
            ProcessedCounters::new(),
            Duration::from_secs(60),
            cancel.clone(),
        );
        let task = tokio::spawn(reporter.run());

        tokio::time::sleep(Duration::from_secs(150)).await;
        cancel.cancel();

        assert_eq!(task.await.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_report_before_first_interval() {
        let cancel = CancellationToken::new();
        let reporter = StatusReporter::new(
            ProcessedCounters::new(),
            Duration::from_secs(60),
            cancel.clone(),
        );
        let task = tokio::spawn(reporter.run());

        tokio::time::sleep(Duration::from_secs(30)).await;
        cancel.cancel();

        assert_eq!(task.await.unwrap(), 0);
    }
}
