//! Batch scheduler.
//!
//! Splits the rows not yet in the progress store into fixed-size batches
//! (ascending row index) and runs them on a bounded pool of worker threads.
//! Each worker fetches its batch in order, appends the batch to the progress
//! store once, and reports results keyed by row index.

mod batch;
mod pool;
mod progress;

pub use batch::{plan_batches, unprocessed_indices, WorkBatch};
pub use pool::{run_batches, PoolOutput};
pub use progress::{PoolStats, ProgressEvent};
