//! CSV-backed progress store with serialized read-modify-write appends.

use anyhow::{Context, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::types::{ProgressRecord, ProgressSet};

/// Handle to the progress file. Share it between workers behind an `Arc`.
///
/// All appends go through one mutex: each append re-reads the file, merges
/// the new records by index and rewrites the whole set via a temp file and
/// rename, so concurrent batches never lose each other's records.
#[derive(Debug)]
pub struct ProgressStore {
    path: PathBuf,
    write_lock: Mutex<()>,
    appends: AtomicUsize,
}

impl ProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            appends: AtomicUsize::new(0),
        }
    }

    /// Store next to `input`: `dir/name.csv` → `dir/name_progress.csv`.
    pub fn for_input(input: &Path) -> Self {
        Self::new(crate::table::progress_path(input))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Successful appends made through this handle.
    pub fn append_count(&self) -> usize {
        self.appends.load(Ordering::Relaxed)
    }

    /// Load every durable record. A missing file is an empty store; a file
    /// that cannot be parsed is an error (progress is never silently dropped).
    pub fn load(&self) -> Result<ProgressSet> {
        let set = read_records(&self.path)?;
        if set.duplicates() > 0 {
            tracing::warn!(
                path = %self.path.display(),
                duplicates = set.duplicates(),
                "progress file has duplicate indices; keeping the last record for each"
            );
        }
        tracing::debug!(path = %self.path.display(), records = set.len(), "loaded progress");
        Ok(set)
    }

    /// Durably add `batch`. Records for an index already in the store replace it.
    /// Returns the number of records in the store after the write.
    pub fn append(&self, batch: &[ProgressRecord]) -> Result<usize> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| anyhow::anyhow!("progress store lock poisoned"))?;

        let mut set = read_records(&self.path)?;
        set.extend(batch.iter().cloned());
        write_records(&self.path, &set)?;
        self.appends.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            path = %self.path.display(),
            added = batch.len(),
            total = set.len(),
            "progress appended"
        );
        Ok(set.len())
    }
}

fn read_records(path: &Path) -> Result<ProgressSet> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ProgressSet::new()),
        Err(e) => {
            return Err(e).with_context(|| format!("read progress file: {}", path.display()))
        }
    };
    let mut reader = csv::Reader::from_reader(file);
    let mut set = ProgressSet::new();
    for (i, row) in reader.deserialize::<ProgressRecord>().enumerate() {
        let record = row.with_context(|| {
            format!("parse progress file: {} (record {})", path.display(), i + 1)
        })?;
        set.insert(record);
    }
    Ok(set)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "progress.csv".into());
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `set` sorted by index to a temp file, sync, then rename over `path`.
fn write_records(path: &Path, set: &ProgressSet) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create dir: {}", parent.display()))?;
    }
    let tmp = temp_path(path);
    let file =
        File::create(&tmp).with_context(|| format!("create temp file: {}", tmp.display()))?;
    let mut writer = csv::Writer::from_writer(file);
    for record in set.iter() {
        writer
            .serialize(record)
            .with_context(|| format!("write progress record {}", record.index))?;
    }
    // An empty set still gets a header row.
    if set.is_empty() {
        writer.write_record(["Index", "Title", "Rating"])?;
    }
    let file = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flush progress file: {}", e.error()))?;
    file.sync_all().context("sync progress file")?;
    drop(file);
    std::fs::rename(&tmp, path).with_context(|| {
        format!("failed to rename {} to {}", tmp.display(), path.display())
    })?;
    Ok(())
}
