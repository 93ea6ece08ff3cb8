//! Progress events sent from workers to the operator, and pool statistics.

use std::time::Duration;

use crate::lookup::Rating;
use crate::progress_store::RowIndex;
use crate::retry::{ErrorKind, FetchOutcome};

/// Narration of a running pool. Sent over a `std::sync::mpsc` channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// One row finished (value found, no match, or given up).
    RowDone {
        batch: usize,
        index: RowIndex,
        total_rows: usize,
        key: String,
        value: Option<Rating>,
        attempts: u32,
        /// Seconds since the batch started.
        elapsed_secs: f64,
    },
    /// A lookup attempt failed.
    Retry {
        batch: usize,
        index: RowIndex,
        key: String,
        attempt: u32,
        max_attempts: u32,
        kind: ErrorKind,
        error: String,
        delay: Duration,
        will_retry: bool,
    },
    /// A batch was appended to the progress store.
    BatchFlushed {
        batch: usize,
        rows: usize,
        store_total: usize,
    },
}

/// Counters for one pool run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Batches appended to the store.
    pub batches: usize,
    /// Rows fetched (each appears in exactly one batch).
    pub rows: usize,
    /// Rows that got a value.
    pub found: usize,
    /// Rows the service had no match for.
    pub not_found: usize,
    /// Rows given up on after exhausting retries.
    pub exhausted: usize,
    /// Failed lookup attempts.
    pub failed_attempts: u64,
    /// Failed attempts classified as throttling.
    pub throttle_events: u64,
}

impl PoolStats {
    pub(super) fn record(&mut self, outcome: &FetchOutcome) {
        self.rows += 1;
        if outcome.value.is_some() {
            self.found += 1;
        } else if outcome.exhausted {
            self.exhausted += 1;
        } else {
            self.not_found += 1;
        }
        self.failed_attempts += u64::from(outcome.failures());
        self.throttle_events += u64::from(outcome.throttled);
    }

    pub(super) fn merge(&mut self, other: &PoolStats) {
        self.batches += other.batches;
        self.rows += other.rows;
        self.found += other.found;
        self.not_found += other.not_found;
        self.exhausted += other.exhausted;
        self.failed_attempts += other.failed_attempts;
        self.throttle_events += other.throttle_events;
    }
}
