//! Bounded worker pool over work batches.

use anyhow::Result;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::progress_store::{ProgressStore, RatingResult};
use crate::retry::RetryingFetcher;

use super::batch::WorkBatch;
use super::progress::{PoolStats, ProgressEvent};

/// Results of a drained pool.
#[derive(Debug, Clone, Default)]
pub struct PoolOutput {
    /// Fresh results in completion order. Consumers must key them by `index`.
    pub results: Vec<RatingResult>,
    pub stats: PoolStats,
}

struct BatchOutcome {
    results: Vec<RatingResult>,
    stats: PoolStats,
}

/// Run `batches` on `workers` threads. Every batch is fetched key by key,
/// appended to `store` in a single call, then reported back here.
///
/// Lookup failures never surface (the fetcher absorbs them). A failed store
/// append is fatal: no further batches are started, in-flight batches finish,
/// and the first append error is returned.
pub fn run_batches(
    keys: Arc<[String]>,
    batches: Vec<WorkBatch>,
    fetcher: RetryingFetcher,
    store: Arc<ProgressStore>,
    workers: usize,
    progress_tx: Option<mpsc::Sender<ProgressEvent>>,
) -> Result<PoolOutput> {
    let count = batches.len();
    if count == 0 {
        return Ok(PoolOutput::default());
    }
    let work: Arc<Mutex<VecDeque<WorkBatch>>> = Arc::new(Mutex::new(batches.into_iter().collect()));
    let abort_requested = Arc::new(AtomicBool::new(false));
    let (tx, rx) = mpsc::channel();
    let num_workers = workers.max(1).min(count);
    tracing::info!(batches = count, workers = num_workers, "starting worker pool");

    let mut handles = Vec::with_capacity(num_workers);
    for worker in 0..num_workers {
        let work = Arc::clone(&work);
        let tx = tx.clone();
        let abort = Arc::clone(&abort_requested);
        let keys = Arc::clone(&keys);
        let fetcher = fetcher.clone();
        let store = Arc::clone(&store);
        let events = progress_tx.clone();
        handles.push(std::thread::spawn(move || loop {
            if abort.load(Ordering::Relaxed) {
                break;
            }
            let batch = match work.lock().unwrap_or_else(|e| e.into_inner()).pop_front() {
                Some(b) => b,
                None => break,
            };
            tracing::debug!(worker, batch = batch.id, rows = batch.indices.len(), "batch started");
            let id = batch.id;
            let res = process_batch(&batch, &keys, &fetcher, &store, events.as_ref());
            if tx.send((id, res)).is_err() {
                break;
            }
        }));
    }
    drop(tx);

    let mut output = PoolOutput::default();
    let mut first_error: Option<anyhow::Error> = None;
    let mut to_receive = count;
    while to_receive > 0 {
        let (id, res) = match rx.recv() {
            Ok(pair) => pair,
            Err(_) => {
                if first_error.is_none() {
                    first_error = Some(anyhow::anyhow!(
                        "worker result channel closed (worker may have panicked)"
                    ));
                }
                break;
            }
        };
        to_receive -= 1;
        match res {
            Ok(outcome) => {
                output.stats.merge(&outcome.stats);
                output.results.extend(outcome.results);
            }
            Err(e) => {
                tracing::error!(batch = id, error = %format!("{:#}", e), "progress append failed; stopping");
                abort_requested.store(true, Ordering::Relaxed);
                let drained = {
                    let mut q = work.lock().unwrap_or_else(|e| e.into_inner());
                    let n = q.len();
                    q.clear();
                    n
                };
                to_receive = to_receive.saturating_sub(drained);
                if first_error.is_none() {
                    first_error = Some(e.context(format!("batch {}", id)));
                }
            }
        }
    }
    for h in handles {
        if let Err(e) = h.join() {
            if first_error.is_none() {
                first_error = Some(anyhow::anyhow!("worker panicked: {:?}", e));
            }
        }
    }
    if let Some(e) = first_error {
        return Err(e);
    }
    Ok(output)
}

/// Fetch every key of `batch` in order, then append the batch to the store once.
fn process_batch(
    batch: &WorkBatch,
    keys: &[String],
    fetcher: &RetryingFetcher,
    store: &ProgressStore,
    events: Option<&mpsc::Sender<ProgressEvent>>,
) -> Result<BatchOutcome> {
    let start = Instant::now();
    let total_rows = keys.len();
    let mut results = Vec::with_capacity(batch.indices.len());
    let mut stats = PoolStats::default();

    for &index in &batch.indices {
        let key = keys.get(index).map(String::as_str).unwrap_or_default();
        let outcome = fetcher.fetch_with(key, |n| {
            if let Some(tx) = events {
                let _ = tx.send(ProgressEvent::Retry {
                    batch: batch.id,
                    index,
                    key: key.to_string(),
                    attempt: n.attempt,
                    max_attempts: n.max_attempts,
                    kind: n.kind,
                    error: n.error.clone(),
                    delay: n.delay,
                    will_retry: n.will_retry,
                });
            }
        });
        stats.record(&outcome);
        results.push(RatingResult::new(index, key, outcome.value));
        if let Some(tx) = events {
            let _ = tx.send(ProgressEvent::RowDone {
                batch: batch.id,
                index,
                total_rows,
                key: key.to_string(),
                value: outcome.value,
                attempts: outcome.attempts,
                elapsed_secs: start.elapsed().as_secs_f64(),
            });
        }
    }

    let store_total = store.append(&results)?;
    stats.batches = 1;
    if let Some(tx) = events {
        let _ = tx.send(ProgressEvent::BatchFlushed {
            batch: batch.id,
            rows: results.len(),
            store_total,
        });
    }
    Ok(BatchOutcome { results, stats })
}
