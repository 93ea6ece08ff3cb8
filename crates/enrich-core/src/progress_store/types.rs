//! Types shared by the progress store, scheduler and assembler.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::lookup::Rating;

/// Stable position of a row in the source dataset.
pub type RowIndex = usize;

/// Outcome of processing one row. `value` is `None` for a miss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingResult {
    #[serde(rename = "Index")]
    pub index: RowIndex,
    #[serde(rename = "Title")]
    pub key: String,
    #[serde(rename = "Rating")]
    pub value: Option<Rating>,
}

impl RatingResult {
    pub fn new(index: RowIndex, key: impl Into<String>, value: Option<Rating>) -> Self {
        Self {
            index,
            key: key.into(),
            value,
        }
    }
}

/// Persisted form of a [`RatingResult`]; the on-disk columns are `Index,Title,Rating`.
pub type ProgressRecord = RatingResult;

/// Records loaded from the store: at most one per row index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressSet {
    records: BTreeMap<RowIndex, ProgressRecord>,
    duplicates: usize,
}

impl ProgressSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the record for `record.index`.
    /// Returns true if an earlier record for that index was replaced.
    pub fn insert(&mut self, record: ProgressRecord) -> bool {
        let replaced = self.records.insert(record.index, record).is_some();
        if replaced {
            self.duplicates += 1;
        }
        replaced
    }

    pub fn extend<I: IntoIterator<Item = ProgressRecord>>(&mut self, records: I) {
        for r in records {
            self.insert(r);
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records that replaced an earlier record with the same index.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn get(&self, index: RowIndex) -> Option<&ProgressRecord> {
        self.records.get(&index)
    }

    /// Records in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = &ProgressRecord> {
        self.records.values()
    }

    /// Indices to exclude from scheduling. With `retry_misses`, rows recorded
    /// without a value are left out so they get fetched again.
    pub fn processed_indices(&self, retry_misses: bool) -> BTreeSet<RowIndex> {
        self.records
            .values()
            .filter(|r| !retry_misses || r.value.is_some())
            .map(|r| r.index)
            .collect()
    }

    /// Number of recorded misses (rows without a value).
    pub fn misses(&self) -> usize {
        self.records.values().filter(|r| r.value.is_none()).count()
    }
}

impl FromIterator<ProgressRecord> for ProgressSet {
    fn from_iter<I: IntoIterator<Item = ProgressRecord>>(iter: I) -> Self {
        let mut set = ProgressSet::new();
        set.extend(iter);
        set
    }
}
