//! Directory scanning and worklist construction.
//!
//! Walks the source tree in deterministic name order, fingerprints every
//! regular file and filters out anything oversized or already present in the
//! ledger. The outcome is the ordered worklist the upload engine consumes,
//! plus the aggregate byte total shown at the confirmation gate. Scanning
//! never mutates the ledger.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::RunConfig;
use crate::hash;

/// One file selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub absolute_path: PathBuf,
    /// Forward-slash normalized path relative to the scanned root.
    pub relative_path: String,
    pub content_hash: String,
    pub size_bytes: u64,
}

/// Result of scanning one source tree.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Files to upload, in discovery order.
    pub worklist: Vec<WorkItem>,
    pub total_bytes: u64,
    pub skipped_oversize: usize,
    pub skipped_dedup: usize,
}

impl ScanOutcome {
    pub fn total_mb(&self) -> f64 {
        self.total_bytes as f64 / (1024.0 * 1024.0)
    }
}

#[derive(Debug)]
pub enum ScanError {
    NotADirectory(PathBuf),
    Io(std::io::Error),
    Walk(walkdir::Error),
}

impl From<std::io::Error> for ScanError {
    fn from(e: std::io::Error) -> Self {
        ScanError::Io(e)
    }
}

impl From<walkdir::Error> for ScanError {
    fn from(e: walkdir::Error) -> Self {
        ScanError::Walk(e)
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::NotADirectory(path) => {
                write!(f, "not a directory: {}", path.display())
            }
            ScanError::Io(e) => write!(f, "scan I/O error: {e}"),
            ScanError::Walk(e) => write!(f, "scan walk error: {e}"),
        }
    }
}

impl std::error::Error for ScanError {}

/// Enumerate all regular files under `root`, rejecting oversized files and
/// files whose content hash already appears in `known_hashes`.
///
/// The size ceiling is applied before the file is hashed, so oversized files
/// never reach the dedup check at all. An empty worklist is a successful
/// outcome.
pub fn scan(
    root: &Path,
    config: &RunConfig,
    known_hashes: &HashSet<String>,
) -> Result<ScanOutcome, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    info!(root = %root.display(), "Scanning files");
    let size_ceiling = config.max_file_size_mb * 1024 * 1024;
    let mut outcome = ScanOutcome::default();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let size_bytes = entry.metadata()?.len();
        let relative_path = relative_forward_slash(entry.path(), root);

        if size_bytes > size_ceiling {
            warn!(
                file = %relative_path,
                size_mb = size_bytes as f64 / (1024.0 * 1024.0),
                ceiling_mb = config.max_file_size_mb,
                "File too big, skipping"
            );
            outcome.skipped_oversize += 1;
            continue;
        }

        let content_hash = hash::sha256_file(entry.path())?;
        if known_hashes.contains(&content_hash) {
            debug!(file = %relative_path, "Already uploaded, skipping");
            outcome.skipped_dedup += 1;
            continue;
        }

        outcome.total_bytes += size_bytes;
        outcome.worklist.push(WorkItem {
            absolute_path: entry.path().to_path_buf(),
            relative_path,
            content_hash,
            size_bytes,
        });
    }

    info!(
        files = outcome.worklist.len(),
        total_mb = outcome.total_mb(),
        skipped_oversize = outcome.skipped_oversize,
        skipped_dedup = outcome.skipped_dedup,
        "Scan complete"
    );
    Ok(outcome)
}

/// Estimated transfer time at a fixed assumed rate, in seconds.
pub fn estimate_upload_secs(total_bytes: u64, assumed_mb_per_sec: f64) -> f64 {
    let total_mb = total_bytes as f64 / (1024.0 * 1024.0);
    total_mb / assumed_mb_per_sec
}

fn relative_forward_slash(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
