use std::fs::write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

use packrat::load_config::load_run_config;

#[test]
fn no_file_yields_the_documented_defaults() {
    let config = load_run_config(None).expect("defaults always load");
    assert_eq!(config.max_file_size_mb, 500);
    assert_eq!(config.upload_retries, 2);
    assert_eq!(config.rate_limit_secs, 10);
    assert_eq!(config.retry_backoff_secs, 5);
    assert_eq!(config.ledger_path, PathBuf::from("uploaded.log"));
    assert_eq!(config.failure_log_path, PathBuf::from("Failed.log"));
    assert_eq!(config.state_path, PathBuf::from(".push_state"));
    assert_eq!(config.site_path, PathBuf::from("index.html"));
    assert_eq!(config.download_base_url, "https://archive.org/download");
    assert_eq!(config.collection, "opensource");
}

#[test]
fn present_keys_override_and_absent_keys_keep_defaults() {
    let file = NamedTempFile::new().expect("Creating temp config file failed");
    write(
        file.path(),
        b"max_file_size_mb: 100\ncollection: test-items\nrate_limit_secs: 0\n",
    )
    .expect("Writing temp config failed");

    let config = load_run_config(Some(file.path())).expect("overrides should parse");
    assert_eq!(config.max_file_size_mb, 100);
    assert_eq!(config.collection, "test-items");
    assert_eq!(config.rate_limit_secs, 0);
    // Untouched keys fall back to the defaults.
    assert_eq!(config.upload_retries, 2);
    assert_eq!(config.ledger_path, PathBuf::from("uploaded.log"));
}

#[test]
fn missing_file_is_a_clear_error() {
    let err = load_run_config(Some(std::path::Path::new("/definitely/not/here.yaml")))
        .expect_err("missing file must fail");
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
fn malformed_yaml_is_a_clear_error() {
    let file = NamedTempFile::new().unwrap();
    write(file.path(), b"max_file_size_mb: [not a number\n").unwrap();

    let err = load_run_config(Some(file.path())).expect_err("bad yaml must fail");
    assert!(err.to_string().contains("Failed to parse config YAML"));
}

#[test]
fn unknown_keys_are_rejected() {
    let file = NamedTempFile::new().unwrap();
    write(file.path(), b"upload_retriez: 7\n").unwrap();

    assert!(load_run_config(Some(file.path())).is_err());
}
