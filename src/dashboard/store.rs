/// Running HTTP statistics
///
/// Two independently locked structures:
/// - the window aggregate, drained and reset by every flush that found data
/// - the per-url table, which accumulates for the lifetime of the process
///
/// The two locks are never held together; readers of one never contend
/// with writers of the other.
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use super::events::HttpSample;
use crate::logger::{self, LogTag};

// ============================================================================
// WINDOW AGGREGATE
// ============================================================================

/// Statistics over all HTTP events since the last flush
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowAggregate {
    pub count: u64,
    /// Time of the first request in the window
    pub window_start_time: i64,
    pub peak_duration: f64,
    pub peak_url: String,
    pub mean_duration: f64,
}

impl WindowAggregate {
    fn record(&mut self, sample: &HttpSample) {
        if self.count == 0 {
            self.count = 1;
            self.window_start_time = sample.time;
            self.mean_duration = sample.duration;
            self.peak_duration = sample.duration;
            self.peak_url = sample.url.clone();
            return;
        }

        self.count += 1;
        let n = self.count as f64;
        self.mean_duration = (self.mean_duration * (n - 1.0) + sample.duration) / n;

        // Strict: on ties the earliest peak wins
        if sample.duration > self.peak_duration {
            self.peak_duration = sample.duration;
            self.peak_url = sample.url.clone();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

// ============================================================================
// URL STATS
// ============================================================================

/// Lifetime statistics of one url
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UrlStat {
    pub mean_duration: f64,
    pub hit_count: u64,
}

impl UrlStat {
    fn first(duration: f64) -> Self {
        Self {
            mean_duration: duration,
            hit_count: 1,
        }
    }

    fn record(&mut self, duration: f64) {
        let hits = self.hit_count as f64;
        self.mean_duration = (self.mean_duration * hits + duration) / (hits + 1.0);
        self.hit_count += 1;
    }
}

// ============================================================================
// STORE
// ============================================================================

pub struct AggregateStore {
    window: Mutex<WindowAggregate>,
    urls: Mutex<HashMap<String, UrlStat>>,

    /// Url table size that triggers the one-time growth warning (0 = never)
    url_warn_threshold: usize,
    url_warned: AtomicBool,
}

impl AggregateStore {
    pub fn new() -> Self {
        Self::with_url_warn_threshold(0)
    }

    /// The url table is never evicted; crossing `threshold` entries only
    /// logs a warning so unbounded growth is visible to operators.
    pub fn with_url_warn_threshold(threshold: usize) -> Self {
        Self {
            window: Mutex::new(WindowAggregate::default()),
            urls: Mutex::new(HashMap::new()),
            url_warn_threshold: threshold,
            url_warned: AtomicBool::new(false),
        }
    }

    /// Fold one completed request into the window and the url table
    pub fn record_http(&self, sample: &HttpSample) {
        self.window.lock().record(sample);

        let url_count = {
            let mut urls = self.urls.lock();
            match urls.get_mut(&sample.url) {
                Some(stat) => stat.record(sample.duration),
                None => {
                    urls.insert(sample.url.clone(), UrlStat::first(sample.duration));
                }
            }
            urls.len()
        };

        self.check_url_growth(url_count);
    }

    /// Take the current window if it saw any request, leaving it empty
    ///
    /// Returns `None` when nothing happened since the previous drain.
    pub fn drain_window(&self) -> Option<WindowAggregate> {
        let mut window = self.window.lock();
        if window.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut *window))
    }

    /// Copy of the lifetime url table (not reset)
    pub fn snapshot_url_stats(&self) -> HashMap<String, UrlStat> {
        self.urls.lock().clone()
    }

    /// Copy of the current window without resetting it
    pub fn peek_window(&self) -> WindowAggregate {
        self.window.lock().clone()
    }

    pub fn url_count(&self) -> usize {
        self.urls.lock().len()
    }

    fn check_url_growth(&self, url_count: usize) {
        if self.url_warn_threshold == 0 || url_count < self.url_warn_threshold {
            return;
        }
        if !self.url_warned.swap(true, Ordering::Relaxed) {
            logger::warning(
                LogTag::Dashboard,
                &format!(
                    "Url statistics table reached {} entries and is never evicted; \
                     high-cardinality urls will keep growing memory",
                    url_count
                ),
            );
        }
    }
}

impl Default for AggregateStore {
    fn default() -> Self {
        Self::new()
    }
}
