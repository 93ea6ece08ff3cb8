//! Work partitioning.

use std::collections::BTreeSet;

use crate::progress_store::RowIndex;

/// Rows processed together by one worker and flushed to the store together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkBatch {
    /// Position in submission order (0-based); used in narration only.
    pub id: usize,
    /// Row indices, processed in this order.
    pub indices: Vec<RowIndex>,
}

/// Indices in `[0, total)` not in `processed`, ascending.
pub fn unprocessed_indices(total: usize, processed: &BTreeSet<RowIndex>) -> Vec<RowIndex> {
    (0..total).filter(|i| !processed.contains(i)).collect()
}

/// Split `indices` into consecutive batches of at most `batch_size` (min 1), preserving order.
pub fn plan_batches(indices: &[RowIndex], batch_size: usize) -> Vec<WorkBatch> {
    indices
        .chunks(batch_size.max(1))
        .enumerate()
        .map(|(id, chunk)| WorkBatch {
            id,
            indices: chunk.to_vec(),
        })
        .collect()
}
