//! Per-property scoring latency, recorded in nanoseconds.
//! Scoring workers fill their own histogram; the batch driver merges them here
//! and the API reads the percentiles.

use std::sync::Mutex;

use hdrhistogram::Histogram;
use serde::Serialize;

use crate::error::{AppError, Result};

/// Highest trackable value: 60s in nanoseconds.
const MAX_TRACKABLE_NS: u64 = 60_000_000_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LatencyPercentiles {
    pub samples: u64,
    pub p50_ns: Option<u64>,
    pub p95_ns: Option<u64>,
    pub p99_ns: Option<u64>,
}

/// Latency of the most recent batch.
pub struct ScoringLatency {
    inner: Mutex<Histogram<u64>>,
}

impl ScoringLatency {
    pub fn new() -> Result<Self> {
        Ok(Self {
            inner: Mutex::new(Self::histogram()?),
        })
    }

    /// An empty histogram with the bounds used throughout. 3 significant figures.
    pub fn histogram() -> Result<Histogram<u64>> {
        Histogram::new_with_bounds(1, MAX_TRACKABLE_NS, 3)
            .map_err(|e| AppError::Metrics(format!("invalid histogram bounds: {e}")))
    }

    /// Drop all samples. Called at the start of every batch.
    pub fn reset(&self) {
        if let Ok(mut h) = self.inner.lock() {
            h.reset();
        }
    }

    /// Fold a worker's histogram into the shared one.
    pub fn merge(&self, worker: &Histogram<u64>) -> Result<()> {
        let mut h = self
            .inner
            .lock()
            .map_err(|_| AppError::Metrics("latency histogram lock poisoned".to_string()))?;
        h.add(worker)
            .map_err(|e| AppError::Metrics(format!("cannot merge latency histogram: {e}")))
    }

    pub fn percentiles(&self) -> LatencyPercentiles {
        let Ok(h) = self.inner.lock() else {
            return LatencyPercentiles::default();
        };
        if h.len() == 0 {
            return LatencyPercentiles::default();
        }
        LatencyPercentiles {
            samples: h.len(),
            p50_ns: Some(h.value_at_quantile(0.5)),
            p95_ns: Some(h.value_at_quantile(0.95)),
            p99_ns: Some(h.value_at_quantile(0.99)),
        }
    }
}
