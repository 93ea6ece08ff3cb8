//! Run context: load progress, schedule the remaining rows, assemble, write output.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::assemble::{assemble, ResultVector};
use crate::config::EnrichConfig;
use crate::lookup::LookupClient;
use crate::progress_store::ProgressStore;
use crate::retry::{RetryPolicy, RetryingFetcher};
use crate::scheduler::{self, PoolStats, ProgressEvent};
use crate::table::{self, Table};

/// Scheduling knobs for one run.
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    pub batch_size: usize,
    pub workers: usize,
    /// Fetch again rows stored without a value.
    pub retry_misses: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            batch_size: 5,
            workers: 4,
            retry_misses: false,
        }
    }
}

impl From<&EnrichConfig> for PipelineOptions {
    fn from(cfg: &EnrichConfig) -> Self {
        Self {
            batch_size: cfg.effective_batch_size(),
            workers: cfg.effective_workers(),
            retry_misses: cfg.retry_misses,
        }
    }
}

/// Summary of one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub total_rows: usize,
    /// Rows taken from the progress store without fetching.
    pub resumed: usize,
    /// Rows scheduled for fetching this run.
    pub scheduled: usize,
    pub pool: PoolStats,
    /// Entries of the final vector holding a value.
    pub found: usize,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn missing(&self) -> usize {
        self.total_rows - self.found
    }
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub results: ResultVector,
    pub report: RunReport,
}

/// The enrichment engine. Owns the fetcher (and through it the lookup
/// client) and the progress store for the duration of a run.
pub struct Pipeline {
    fetcher: RetryingFetcher,
    store: Arc<ProgressStore>,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        client: Arc<dyn LookupClient>,
        policy: RetryPolicy,
        store: Arc<ProgressStore>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            fetcher: RetryingFetcher::new(client, policy),
            store,
            options,
        }
    }

    pub fn from_config(
        client: Arc<dyn LookupClient>,
        cfg: &EnrichConfig,
        store: Arc<ProgressStore>,
    ) -> Result<Self> {
        let policy = cfg.retry.to_policy()?;
        Ok(Self::new(client, policy, store, PipelineOptions::from(cfg)))
    }

    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    /// Enrich `keys` (row `i` has key `keys[i]`), resuming from the store.
    ///
    /// Rows already in the store are not fetched. Returns one entry per key.
    pub fn run(
        &self,
        keys: Vec<String>,
        progress_tx: Option<mpsc::Sender<ProgressEvent>>,
    ) -> Result<RunOutcome> {
        let start = Instant::now();
        let total = keys.len();
        let stored = self
            .store
            .load()
            .with_context(|| format!("load progress: {}", self.store.path().display()))?;

        let processed = stored.processed_indices(self.options.retry_misses);
        let todo = scheduler::unprocessed_indices(total, &processed);
        let resumed = total - todo.len();
        let batches = scheduler::plan_batches(&todo, self.options.batch_size);
        tracing::info!(
            total,
            resumed,
            scheduled = todo.len(),
            batches = batches.len(),
            "resuming from progress store"
        );

        let keys: Arc<[String]> = keys.into();
        let pool = scheduler::run_batches(
            keys,
            batches,
            self.fetcher.clone(),
            Arc::clone(&self.store),
            self.options.workers,
            progress_tx,
        )?;

        let results = assemble(total, &stored, &pool.results);
        let report = RunReport {
            total_rows: total,
            resumed,
            scheduled: todo.len(),
            pool: pool.stats,
            found: results.found(),
            elapsed: start.elapsed(),
        };
        tracing::info!(?report, "run complete");
        Ok(RunOutcome { results, report })
    }
}

/// Outcome of enriching a file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub output_path: PathBuf,
    pub progress_path: PathBuf,
    pub report: RunReport,
}

/// Enrich the CSV at `input`: read keys from `cfg.key_column`, run the
/// pipeline with the progress file next to the input, and write the table
/// plus `cfg.output_column` to the derived output path.
///
/// A missing key column fails before the progress file is touched.
pub fn enrich_file(
    input: &Path,
    cfg: &EnrichConfig,
    client: Arc<dyn LookupClient>,
    progress_tx: Option<mpsc::Sender<ProgressEvent>>,
) -> Result<FileReport> {
    let mut table = Table::read(input)?;
    let keys = table.column(&cfg.key_column)?;

    let store = Arc::new(ProgressStore::for_input(input));
    let progress_path = store.path().to_path_buf();
    let pipeline = Pipeline::from_config(client, cfg, store)?;
    let outcome = pipeline.run(keys, progress_tx)?;

    let cells = outcome
        .results
        .as_slice()
        .iter()
        .map(|v| table::format_rating(*v))
        .collect();
    table.set_column(&cfg.output_column, cells)?;
    let output_path = table::output_path(input);
    table.write(&output_path)?;
    tracing::info!(output = %output_path.display(), "output written");

    Ok(FileReport {
        output_path,
        progress_path,
        report: outcome.report,
    })
}
