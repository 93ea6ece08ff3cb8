//! `enrich merge <data> <progress>` – join ratings from a progress file onto a dataset.

use anyhow::Result;
use enrich_core::config::EnrichConfig;
use enrich_core::merge;
use enrich_core::table;
use std::path::Path;

pub fn run_merge(cfg: &EnrichConfig, data: &Path, progress: &Path) -> Result<()> {
    table::ensure_file(data)?;
    table::ensure_file(progress)?;
    let report = merge::merge_files(data, progress, &cfg.key_column, &cfg.output_column)?;
    println!(
        "Merged data saved to: {} ({} of {} rows matched)",
        report.output_path.display(),
        report.matched,
        report.rows
    );
    Ok(())
}
