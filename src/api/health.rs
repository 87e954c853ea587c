//! Shared batch state for the /health endpoint.
//! Updated by BatchScorer, read by the API.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Default)]
pub struct BatchHealth {
    /// True while a batch is loading, scoring or writing.
    pub batch_running: AtomicBool,
    /// Nanosecond timestamp of the last completed batch (0 = none).
    pub last_batch_at_ns: AtomicU64,
    pub batches_completed: AtomicU64,
    /// Failed property count of the last completed batch.
    pub last_batch_failed: AtomicU64,
}

impl BatchHealth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_batch_running(&self, v: bool) {
        self.batch_running.store(v, Ordering::Relaxed);
    }

    pub fn record_batch(&self, finished_at_ns: u64, failed: u64) {
        self.last_batch_at_ns.store(finished_at_ns, Ordering::Relaxed);
        self.last_batch_failed.store(failed, Ordering::Relaxed);
        self.batches_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn batch_running(&self) -> bool {
        self.batch_running.load(Ordering::Relaxed)
    }

    pub fn last_batch_at_ns(&self) -> u64 {
        self.last_batch_at_ns.load(Ordering::Relaxed)
    }

    pub fn batches_completed(&self) -> u64 {
        self.batches_completed.load(Ordering::Relaxed)
    }

    pub fn last_batch_failed(&self) -> u64 {
        self.last_batch_failed.load(Ordering::Relaxed)
    }
}
