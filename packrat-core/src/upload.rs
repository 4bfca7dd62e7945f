//! Sequential upload engine: orchestrates worklist → archive → ledger.
//!
//! Processes worklist items strictly in discovery order — the remote service
//! is rate limited, so there is deliberately no parallelism. Each item gets a
//! courtesy delay before every attempt, a bounded retry budget with a fixed
//! backoff between attempts, and a terminal per-item outcome: a ledger entry
//! on success or a failure record once the budget is exhausted. One item
//! failing never aborts the batch, and both logs are flushed per item, so a
//! crash mid-batch loses at most the in-flight item's result.
//!
//! # Navigation
//! - Main entrypoint: [`run_batch`]
//! - Supporting types: [`BatchReport`], [`BatchError`]

use chrono::Local;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::RunConfig;
use crate::contract::{ArchiveStore, ItemMetadata, PutRequest};
use crate::ledger::{FailureRecord, Ledger, LedgerEntry};
use crate::scan::WorkItem;

/// Summary of one upload batch.
#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Only ledger writes abort a batch: if the record of a completed upload
/// cannot be made durable, continuing would silently lose dedup state.
#[derive(Debug)]
pub enum BatchError {
    Ledger(crate::ledger::LedgerError),
}

impl From<crate::ledger::LedgerError> for BatchError {
    fn from(e: crate::ledger::LedgerError) -> Self {
        BatchError::Ledger(e)
    }
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchError::Ledger(e) => write!(f, "batch aborted: {e}"),
        }
    }
}

impl std::error::Error for BatchError {}

/// Item identifier for one run: uploader name, sanitized source basename and
/// a compact timestamp, unique per run by construction.
pub fn item_id_for_run(uploader: &str, source_basename: &str) -> String {
    let sanitizer = Regex::new(r"[^A-Za-z0-9-]").expect("static regex");
    let sanitized = sanitizer.replace_all(source_basename, "_");
    format!(
        "{}_{}_{}",
        uploader,
        sanitized,
        Local::now().format("%Y%m%d%H%M%S")
    )
}

/// Upload every worklist item under `item_id`, in order.
pub async fn run_batch<S>(
    config: &RunConfig,
    store: &S,
    ledger: &Ledger,
    worklist: &[WorkItem],
    uploader: &str,
    item_id: &str,
    metadata: &ItemMetadata,
) -> Result<BatchReport, BatchError>
where
    S: ArchiveStore,
{
    info!(
        item_id,
        files = worklist.len(),
        uploader,
        "Starting upload batch"
    );
    let mut report = BatchReport::default();
    let total = worklist.len();

    for (idx, item) in worklist.iter().enumerate() {
        report.attempted += 1;
        info!(
            file = %item.relative_path,
            position = idx + 1,
            total,
            "Uploading file"
        );

        match upload_one(config, store, item, item_id, metadata).await {
            Ok(()) => {
                let entry =
                    LedgerEntry::new(item_id, uploader, &item.relative_path, &item.content_hash);
                ledger.append(&entry)?;
                report.succeeded += 1;
                info!(file = %item.relative_path, "Upload succeeded");
            }
            Err(message) => {
                error!(file = %item.relative_path, error = %message, "Final upload failure");
                let record =
                    FailureRecord::new(item_id, &item.relative_path, &item.content_hash, &message);
                ledger.append_failure(&record)?;
                report.failed += 1;
            }
        }
    }

    info!(
        succeeded = report.succeeded,
        failed = report.failed,
        total,
        "Upload batch complete"
    );
    Ok(report)
}

/// One item through the retry loop. Returns the final error message once the
/// budget is exhausted.
async fn upload_one<S>(
    config: &RunConfig,
    store: &S,
    item: &WorkItem,
    item_id: &str,
    metadata: &ItemMetadata,
) -> Result<(), String>
where
    S: ArchiveStore,
{
    // A file that vanished between scan and upload will not come back;
    // retrying would only burn the backoff budget, so fail it outright.
    if !item.absolute_path.exists() {
        return Err(format!(
            "local file missing: {}",
            item.absolute_path.display()
        ));
    }

    let mut last_error = String::new();
    for attempt in 0..=config.upload_retries {
        if attempt > 0 {
            tokio::time::sleep(Duration::from_secs(config.retry_backoff_secs)).await;
        }
        // Courtesy delay before every attempt.
        tokio::time::sleep(Duration::from_secs(config.rate_limit_secs)).await;

        let request = PutRequest {
            item_id,
            remote_path: &item.relative_path,
            local_path: &item.absolute_path,
            metadata,
        };
        match store.put_file(request).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                warn!(
                    file = %item.relative_path,
                    attempt = attempt + 1,
                    attempts_allowed = config.upload_retries + 1,
                    error = %e,
                    "Upload attempt failed"
                );
                last_error = e.to_string();
            }
        }
    }
    Err(last_error)
}
