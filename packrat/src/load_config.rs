/// `load_config` module: loads an optional YAML overrides file and adapts it
/// onto the built-in [`RunConfig`] defaults.
///
/// This module is the only place where untrusted YAML is parsed and mapped to
/// the strongly-typed core config.
///
/// # Responsibilities
/// - Parse the user-supplied YAML overrides file into a loosely-typed struct
///   where every key is optional
/// - Apply present keys over `RunConfig::default()`, leaving the rest at
///   their documented defaults
/// - Ensure robust error messages for CLI and tests: any failure in loading
///   must result in clear diagnostics
///
/// # Errors
/// All errors in this module use `anyhow::Error` for context-rich
/// diagnostics, surfaced at the CLI boundary.
use anyhow::Result;
use packrat_core::config::RunConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// YAML-side mirror of [`RunConfig`] with every key optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    pub max_file_size_mb: Option<u64>,
    pub upload_retries: Option<u32>,
    pub rate_limit_secs: Option<u64>,
    pub retry_backoff_secs: Option<u64>,
    pub assumed_upload_mb_per_sec: Option<f64>,
    pub ledger_path: Option<PathBuf>,
    pub failure_log_path: Option<PathBuf>,
    pub state_path: Option<PathBuf>,
    pub site_path: Option<PathBuf>,
    pub download_base_url: Option<String>,
    pub collection: Option<String>,
}

impl ConfigOverrides {
    fn apply(self, mut config: RunConfig) -> RunConfig {
        if let Some(v) = self.max_file_size_mb {
            config.max_file_size_mb = v;
        }
        if let Some(v) = self.upload_retries {
            config.upload_retries = v;
        }
        if let Some(v) = self.rate_limit_secs {
            config.rate_limit_secs = v;
        }
        if let Some(v) = self.retry_backoff_secs {
            config.retry_backoff_secs = v;
        }
        if let Some(v) = self.assumed_upload_mb_per_sec {
            config.assumed_upload_mb_per_sec = v;
        }
        if let Some(v) = self.ledger_path {
            config.ledger_path = v;
        }
        if let Some(v) = self.failure_log_path {
            config.failure_log_path = v;
        }
        if let Some(v) = self.state_path {
            config.state_path = v;
        }
        if let Some(v) = self.site_path {
            config.site_path = v;
        }
        if let Some(v) = self.download_base_url {
            config.download_base_url = v;
        }
        if let Some(v) = self.collection {
            config.collection = v;
        }
        config
    }
}

/// Resolve the effective run configuration: built-in defaults, overridden by
/// the YAML file when one is given.
pub fn load_run_config(path: Option<&Path>) -> Result<RunConfig> {
    let config = match path {
        None => RunConfig::default(),
        Some(path) => {
            info!(config_path = ?path, "Loading configuration overrides from file");
            let content = match fs::read_to_string(path) {
                Ok(content) => content,
                Err(e) => {
                    error!(error = ?e, config_path = ?path, "Failed to read config file");
                    return Err(anyhow::anyhow!(
                        "Failed to read config file {:?}: {}",
                        path,
                        e
                    ));
                }
            };
            let overrides: ConfigOverrides = match serde_yaml::from_str(&content) {
                Ok(overrides) => {
                    info!(config_path = ?path, "Parsed config YAML successfully");
                    overrides
                }
                Err(e) => {
                    error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
                    return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
                }
            };
            overrides.apply(RunConfig::default())
        }
    };
    config.trace_loaded();
    Ok(config)
}
