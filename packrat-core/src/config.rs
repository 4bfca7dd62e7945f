use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

/// Runtime configuration for a packrat run.
///
/// Everything tunable lives here rather than in module-level constants, so
/// tests can run with different thresholds (zeroed sleeps, tiny size
/// ceilings) without patching globals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Files larger than this many MiB are skipped outright.
    pub max_file_size_mb: u64,
    /// Additional attempts after the first failed upload of an item.
    pub upload_retries: u32,
    /// Courtesy delay before every upload attempt, in seconds.
    pub rate_limit_secs: u64,
    /// Delay between a failed attempt and its retry, in seconds.
    pub retry_backoff_secs: u64,
    /// Assumed transfer rate used for the pre-upload time estimate.
    pub assumed_upload_mb_per_sec: f64,
    /// Append-only ledger of successful uploads.
    pub ledger_path: PathBuf,
    /// Append-only log of items that exhausted their retry budget.
    pub failure_log_path: PathBuf,
    /// Sentinel file backing the pending-publish state.
    pub state_path: PathBuf,
    /// Rendered index page.
    pub site_path: PathBuf,
    /// Base URL that download links on the index page point at.
    pub download_base_url: String,
    /// Collection new items are filed under at the archival service.
    pub collection: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 500,
            upload_retries: 2,
            rate_limit_secs: 10,
            retry_backoff_secs: 5,
            assumed_upload_mb_per_sec: 5.0,
            ledger_path: PathBuf::from("uploaded.log"),
            failure_log_path: PathBuf::from("Failed.log"),
            state_path: PathBuf::from(".push_state"),
            site_path: PathBuf::from("index.html"),
            download_base_url: String::from("https://archive.org/download"),
            collection: String::from("opensource"),
        }
    }
}

impl RunConfig {
    pub fn trace_loaded(&self) {
        info!(
            max_file_size_mb = self.max_file_size_mb,
            upload_retries = self.upload_retries,
            rate_limit_secs = self.rate_limit_secs,
            ledger = %self.ledger_path.display(),
            "Loaded RunConfig"
        );
        debug!(?self, "RunConfig loaded (full debug)");
    }
}
