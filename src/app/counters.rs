use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Running totals of records delivered per stream.
#[derive(Debug, Clone, Default)]
pub struct ProcessedCounters {
    inner: Arc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    deploy: AtomicU64,
    http: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CountersSnapshot {
    pub deploy_logs_processed: u64,
    pub http_logs_processed: u64,
}

impl ProcessedCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_deploy(&self, count: u64) {
        self.inner.deploy.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_http(&self, count: u64) {
        self.inner.http.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            deploy_logs_processed: self.inner.deploy.load(Ordering::Relaxed),
            http_logs_processed: self.inner.http.load(Ordering::Relaxed),
        }
    }
}
