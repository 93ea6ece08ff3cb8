//! Merge utility: left-join a dataset against a progress file by title.

use anyhow::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::table::{self, Table};

/// Key and value columns of a progress file.
const PROGRESS_TITLE: &str = "Title";
const PROGRESS_RATING: &str = "Rating";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    pub output_path: PathBuf,
    pub rows: usize,
    /// Rows whose key matched a progress record.
    pub matched: usize,
}

/// Join `data` on `key_column` against `progress`'s `Title` column, adding its
/// `Rating` as `output_column`. Every data row is kept (left join); when a
/// title appears more than once in the progress table the first record wins.
pub fn merge_tables(
    data: &mut Table,
    progress: &Table,
    key_column: &str,
    output_column: &str,
) -> Result<usize> {
    let key_idx = data.require_column(key_column)?;
    let title_idx = progress.require_column(PROGRESS_TITLE)?;
    let rating_idx = progress.require_column(PROGRESS_RATING)?;

    let mut ratings: HashMap<&str, &str> = HashMap::new();
    for row in progress.rows() {
        let title = row.get(title_idx).map(String::as_str).unwrap_or_default();
        let rating = row.get(rating_idx).map(String::as_str).unwrap_or_default();
        ratings.entry(title).or_insert(rating);
    }

    let mut matched = 0usize;
    let cells: Vec<String> = data
        .rows()
        .iter()
        .map(|row| {
            let key = row.get(key_idx).map(String::as_str).unwrap_or_default();
            match ratings.get(key) {
                Some(r) => {
                    matched += 1;
                    r.to_string()
                }
                None => String::new(),
            }
        })
        .collect();
    data.set_column(output_column, cells)?;
    Ok(matched)
}

/// File-level merge: reads both CSVs and writes `<data>_modified.csv`.
pub fn merge_files(
    data_path: &Path,
    progress_path: &Path,
    key_column: &str,
    output_column: &str,
) -> Result<MergeReport> {
    let mut data = Table::read(data_path)?;
    let progress = Table::read(progress_path)?;
    let matched = merge_tables(&mut data, &progress, key_column, output_column)?;

    let output_path = table::output_path(data_path);
    data.write(&output_path)?;
    tracing::info!(
        output = %output_path.display(),
        rows = data.len(),
        matched,
        "merged data saved"
    );
    Ok(MergeReport {
        output_path,
        rows: data.len(),
        matched,
    })
}
