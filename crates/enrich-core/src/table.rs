//! Tabular input/output (CSV) and the file names derived from the input path.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::lookup::Rating;

/// Problems with the input data that stop a run before any lookup.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("'{column}' column is missing from {}", .path.display())]
    MissingColumn { column: String, path: PathBuf },
    #[error("the file {} does not exist", .0.display())]
    NotFound(PathBuf),
    #[error("{} is not a file", .0.display())]
    NotAFile(PathBuf),
}

/// Check that `path` names an existing regular file.
pub fn ensure_file(path: &Path) -> Result<(), InputError> {
    if !path.exists() {
        return Err(InputError::NotFound(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(InputError::NotAFile(path.to_path_buf()));
    }
    Ok(())
}

/// An in-memory CSV table: header plus string cells. Row order defines row index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    path: PathBuf,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn read(path: &Path) -> Result<Table> {
        ensure_file(path)?;
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("open table: {}", path.display()))?;
        let headers = reader
            .headers()
            .with_context(|| format!("read header: {}", path.display()))?
            .iter()
            .map(str::to_string)
            .collect();
        let mut rows = Vec::new();
        for (i, rec) in reader.records().enumerate() {
            let rec = rec.with_context(|| format!("read {} row {}", path.display(), i + 1))?;
            rows.push(rec.iter().map(str::to_string).collect());
        }
        Ok(Table {
            path: path.to_path_buf(),
            headers,
            rows,
        })
    }

    /// Build a table in memory (used by tests and the merge utility).
    pub fn from_parts(headers: Vec<String>, rows: Vec<Vec<String>>) -> Table {
        Table {
            path: PathBuf::new(),
            headers,
            rows,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Index of `name`, or [`InputError::MissingColumn`].
    pub fn require_column(&self, name: &str) -> Result<usize, InputError> {
        self.column_index(name)
            .ok_or_else(|| InputError::MissingColumn {
                column: name.to_string(),
                path: self.path.clone(),
            })
    }

    /// Values of column `name` in row order (missing trailing cells read as empty).
    pub fn column(&self, name: &str) -> Result<Vec<String>, InputError> {
        let idx = self.require_column(name)?;
        Ok(self
            .rows
            .iter()
            .map(|r| r.get(idx).cloned().unwrap_or_default())
            .collect())
    }

    /// Set column `name` to `values`, appending it if absent.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) -> Result<()> {
        if values.len() != self.rows.len() {
            anyhow::bail!(
                "column {} has {} values for {} rows",
                name,
                values.len(),
                self.rows.len()
            );
        }
        let idx = match self.column_index(name) {
            Some(i) => i,
            None => {
                self.headers.push(name.to_string());
                self.headers.len() - 1
            }
        };
        for (row, value) in self.rows.iter_mut().zip(values) {
            if row.len() <= idx {
                row.resize(idx + 1, String::new());
            }
            row[idx] = value;
        }
        Ok(())
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("create output: {}", path.display()))?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer
            .flush()
            .with_context(|| format!("write output: {}", path.display()))?;
        Ok(())
    }
}

/// Cell text for a rating; absent values are empty cells.
pub fn format_rating(value: Option<Rating>) -> String {
    match value {
        Some(v) => format!("{:?}", v),
        None => String::new(),
    }
}

fn sibling_with_suffix(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = input
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "csv".to_string());
    input.with_file_name(format!("{stem}{suffix}.{ext}"))
}

/// `dir/name.csv` → `dir/name_progress.csv`.
pub fn progress_path(input: &Path) -> PathBuf {
    sibling_with_suffix(input, "_progress")
}

/// `dir/name.csv` → `dir/name_modified.csv`.
pub fn output_path(input: &Path) -> PathBuf {
    sibling_with_suffix(input, "_modified")
}
