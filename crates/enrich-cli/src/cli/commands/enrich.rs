//! `enrich <input>` – run the resumable enrichment pipeline on a CSV file.

use anyhow::Result;
use enrich_core::config::{EnrichConfig, API_KEY_ENV};
use enrich_core::lookup::OmdbClient;
use enrich_core::pipeline;
use enrich_core::scheduler::ProgressEvent;
use enrich_core::table;
use std::path::Path;
use std::sync::{mpsc, Arc};

pub fn run_enrich(cfg: &EnrichConfig, input: &Path) -> Result<()> {
    table::ensure_file(input)?;
    if cfg.lookup.resolved_api_key().is_none() {
        println!(
            "Warning: no lookup API key configured (set {} or [lookup] api_key).",
            API_KEY_ENV
        );
    }
    let client = Arc::new(OmdbClient::new(&cfg.lookup)?);

    println!("Starting creating new file");
    let (progress_tx, progress_rx) = mpsc::channel::<ProgressEvent>();
    let printer = std::thread::spawn(move || {
        for event in progress_rx {
            println!("{}", describe_event(&event));
        }
    });

    let result = pipeline::enrich_file(input, cfg, client, Some(progress_tx));
    let _ = printer.join();
    let report = result?;

    let r = &report.report;
    if r.scheduled == 0 {
        println!(
            "All {} rows already in {}.",
            r.total_rows,
            report.progress_path.display()
        );
    }
    println!(
        "{} rows: {} with rating, {} without ({} resumed, {} fetched, {} failed attempts, {} throttled).",
        r.total_rows,
        r.found,
        r.missing(),
        r.resumed,
        r.pool.rows,
        r.pool.failed_attempts,
        r.pool.throttle_events
    );
    println!(
        "Updated data saved to: {}. Total elapsed time: {:.2} seconds.",
        report.output_path.display(),
        r.elapsed.as_secs_f64()
    );
    Ok(())
}

/// Operator line for one pipeline event.
pub(crate) fn describe_event(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::RowDone {
            batch,
            index,
            total_rows,
            elapsed_secs,
            ..
        } => format!(
            "{} Processing {}/{} titles. Elapsed time: {:.2} seconds.",
            batch,
            index + 1,
            total_rows,
            elapsed_secs
        ),
        ProgressEvent::Retry {
            key,
            attempt,
            max_attempts,
            error,
            delay,
            will_retry,
            ..
        } => {
            let next = if *will_retry { "Retrying" } else { "Giving up" };
            format!(
                "Error while fetching rating for: {} ({}), attempt {}/{}. {} after {:.1}s...",
                key,
                error,
                attempt,
                max_attempts,
                next,
                delay.as_secs_f64()
            )
        }
        ProgressEvent::BatchFlushed {
            batch,
            rows,
            store_total,
        } => format!(
            "batch {} saved ({} rows, {} in progress file)",
            batch, rows, store_total
        ),
    }
}
