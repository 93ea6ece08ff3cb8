//! Reconcile stored and fresh results into one dense, index-ordered vector.

use crate::lookup::Rating;
use crate::progress_store::{ProgressSet, RatingResult, RowIndex};

/// One entry per source row: a rating or an explicit absence.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultVector {
    values: Vec<Option<Rating>>,
}

impl ResultVector {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: RowIndex) -> Option<Rating> {
        self.values.get(index).copied().flatten()
    }

    pub fn as_slice(&self) -> &[Option<Rating>] {
        &self.values
    }

    /// Entries holding a value.
    pub fn found(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

/// Build the vector for `total` rows: stored records first, then `fresh`
/// results on top (fresh wins on conflict). Entries are placed by row index,
/// so the arrival order of `fresh` does not matter. Indices `>= total` are ignored.
pub fn assemble(total: usize, stored: &ProgressSet, fresh: &[RatingResult]) -> ResultVector {
    let mut values: Vec<Option<Rating>> = vec![None; total];
    let mut ignored = 0usize;

    let all = stored.iter().chain(fresh.iter());
    for r in all {
        match values.get_mut(r.index) {
            Some(slot) => *slot = r.value,
            None => ignored += 1,
        }
    }
    if ignored > 0 {
        tracing::warn!(ignored, total, "results for rows outside the input were ignored");
    }
    ResultVector { values }
}
