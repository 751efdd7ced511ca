/// Flusher - periodic drain-and-broadcast of the aggregate store
///
/// Runs as one background task. The delay is measured from the end of a
/// cycle, so late cycles are never caught up. `flush_once` is guarded so
/// an out-of-band call can never overlap a scheduled cycle. A failing or
/// panicking cycle is logged and the next one is still scheduled.
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::envelope::{self, HttpAggregatePayload, Topic, UrlAverage};
use super::registry::ConnectionRegistry;
use super::store::AggregateStore;
use crate::errors::DashError;
use crate::logger::{self, LogTag};

/// What one cycle broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub http_sent: bool,
    pub urls_sent: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    Flushed(CycleReport),
    /// Another cycle was still executing
    AlreadyRunning,
    Failed,
}

pub struct Flusher {
    store: Arc<AggregateStore>,
    registry: Arc<ConnectionRegistry>,
    interval: Duration,
    in_progress: AtomicBool,
    cycles: AtomicU64,
    #[cfg(test)]
    panic_next_cycle: AtomicBool,
}

/// Clears the in-progress flag even if the cycle panicked
struct CycleGuard<'a>(&'a AtomicBool);

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Flusher {
    pub fn new(
        store: Arc<AggregateStore>,
        registry: Arc<ConnectionRegistry>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            registry,
            interval,
            in_progress: AtomicBool::new(false),
            cycles: AtomicU64::new(0),
            #[cfg(test)]
            panic_next_cycle: AtomicBool::new(false),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of cycles that ran to completion
    pub fn completed_cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    /// Run a single cycle unless one is already executing
    pub fn flush_once(&self) -> FlushOutcome {
        if self
            .in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return FlushOutcome::AlreadyRunning;
        }
        let _guard = CycleGuard(&self.in_progress);

        match catch_unwind(AssertUnwindSafe(|| self.run_cycle())) {
            Ok(Ok(report)) => {
                let cycle = self.cycles.fetch_add(1, Ordering::Relaxed) + 1;
                logger::verbose(
                    LogTag::Dashboard,
                    &format!(
                        "Flush cycle {} (http={}, httpURLs={}, subscribers={})",
                        cycle,
                        report.http_sent,
                        report.urls_sent,
                        self.registry.len()
                    ),
                );
                FlushOutcome::Flushed(report)
            }
            Ok(Err(e)) => {
                logger::error(LogTag::Dashboard, &format!("Flush cycle failed: {}", e));
                FlushOutcome::Failed
            }
            Err(_) => {
                logger::error(LogTag::Dashboard, "Flush cycle panicked, continuing");
                FlushOutcome::Failed
            }
        }
    }

    fn run_cycle(&self) -> Result<CycleReport, DashError> {
        self.injected_failure();

        let mut report = CycleReport::default();
        let mut failure = None;

        if let Some(window) = self.store.drain_window() {
            let payload = HttpAggregatePayload::from(&window);
            match envelope::encode(Topic::Http, &payload) {
                Ok(message) => {
                    self.registry.broadcast(&message);
                    report.http_sent = true;
                }
                Err(e) => failure = Some(e),
            }
        }

        let urls = self.store.snapshot_url_stats();
        if !urls.is_empty() {
            let mut payload: Vec<UrlAverage> = urls
                .into_iter()
                .map(|(url, stat)| UrlAverage {
                    url,
                    average_response_time: stat.mean_duration,
                })
                .collect();
            payload.sort_by(|a, b| a.url.cmp(&b.url));

            match envelope::encode(Topic::HttpUrls, &payload) {
                Ok(message) => {
                    self.registry.broadcast(&message);
                    report.urls_sent = true;
                }
                Err(e) => failure = failure.or(Some(e)),
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }

    #[cfg(test)]
    fn injected_failure(&self) {
        if self.panic_next_cycle.swap(false, Ordering::AcqRel) {
            panic!("flush cycle failure");
        }
    }

    #[cfg(not(test))]
    #[inline]
    fn injected_failure(&self) {}

    /// Run cycles until `cancel` fires
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        logger::debug(
            LogTag::Dashboard,
            &format!("Flusher started (interval={}ms)", self.interval.as_millis()),
        );

        loop {
            self.flush_once();

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        let metrics = self.registry.metrics().snapshot();
        logger::debug(
            LogTag::Dashboard,
            &format!(
                "Flusher stopped after {} cycles (connections={}, sent={}, dropped={}, failed={})",
                self.completed_cycles(),
                metrics.total_connections,
                metrics.messages_sent,
                metrics.messages_dropped,
                metrics.send_failures
            ),
        );
    }

    pub fn spawn(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(Arc::clone(self).run(cancel))
    }
}
