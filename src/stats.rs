//! Aggregate request statistics
//!
//! Tracks the count and summed latency of completed hash requests.
//! This is the single shared-mutable-state boundary in the service: one
//! mutex guards the count/sum pair so a reader can never observe a count
//! without its matching sum. The critical sections are arithmetic only.

use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;

#[derive(Debug, Default)]
struct StatsInner {
    total: u64,
    sum_micros: u64,
}

/// Process-wide latency/throughput aggregator for hash requests.
///
/// `record` and `snapshot` are linearizable: N concurrent `record` calls
/// always leave `total` incremented by exactly N with their durations
/// folded into the sum, regardless of interleaving.
#[derive(Debug, Default)]
pub struct ResponseStats {
    inner: Mutex<StatsInner>,
}

/// Consistent point-in-time view of the aggregated statistics.
///
/// Serializes as `{"Total": int, "Average": float}` with the average in
/// microseconds, matching the legacy wire format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatsSnapshot {
    #[serde(rename = "Total")]
    pub total: u64,
    #[serde(rename = "Average")]
    pub average: f64,
}

impl ResponseStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed hash request. The duration is folded in as
    /// whole microseconds (truncating, as the legacy service did).
    pub fn record(&self, elapsed: Duration) {
        let mut inner = self.inner.lock().unwrap();
        inner.total += 1;
        inner.sum_micros += elapsed.as_micros() as u64;
    }

    /// Read the count and average as a consistent pair. An aggregator
    /// that has recorded nothing reports `{total: 0, average: 0}`.
    pub fn snapshot(&self) -> StatsSnapshot {
        let inner = self.inner.lock().unwrap();
        let average = if inner.total == 0 {
            0.0
        } else {
            inner.sum_micros as f64 / inner.total as f64
        };
        StatsSnapshot {
            total: inner.total,
            average,
        }
    }
}
