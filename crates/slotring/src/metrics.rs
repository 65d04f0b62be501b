use std::sync::atomic::{AtomicU64, Ordering};

/// Optional counters for monitoring a ring buffer.
///
/// Updated with relaxed atomics and only when `Config::enable_metrics` is
/// set; the counters carry no synchronization meaning.
#[derive(Debug, Default)]
pub(crate) struct Metrics {
    records_pushed: AtomicU64,
    records_pulled: AtomicU64,
    push_batches: AtomicU64,
    pull_batches: AtomicU64,
    full_rejections: AtomicU64,
    empty_rejections: AtomicU64,
}

/// Point-in-time copy of a ring buffer's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub records_pushed: u64,
    pub records_pulled: u64,
    pub push_batches: u64,
    pub pull_batches: u64,
    /// Pushes rejected because the ring was full.
    pub full_rejections: u64,
    /// Pulls rejected because not enough records were published.
    pub empty_rejections: u64,
}

impl Metrics {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_push(&self, records: u64) {
        self.records_pushed.fetch_add(records, Ordering::Relaxed);
        self.push_batches.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_pull(&self, records: u64) {
        self.records_pulled.fetch_add(records, Ordering::Relaxed);
        self.pull_batches.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_full(&self) {
        self.full_rejections.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_empty(&self) {
        self.empty_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_pushed: self.records_pushed.load(Ordering::Relaxed),
            records_pulled: self.records_pulled.load(Ordering::Relaxed),
            push_batches: self.push_batches.load(Ordering::Relaxed),
            pull_batches: self.pull_batches.load(Ordering::Relaxed),
            full_rejections: self.full_rejections.load(Ordering::Relaxed),
            empty_rejections: self.empty_rejections.load(Ordering::Relaxed),
        }
    }
}
