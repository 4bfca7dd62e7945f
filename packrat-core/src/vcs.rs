//! Git CLI client.
//!
//! Implements [`VcsClient`] by shelling out to `git` in a fixed working
//! directory. Every operation is opaque pass/fail: a non-zero exit becomes an
//! error carrying the captured stderr, and stdout is returned trimmed for
//! the query operations.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, error};

use crate::contract::{StoreError, VcsClient};

pub struct GitCli {
    workdir: PathBuf,
}

impl GitCli {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    fn run(&self, args: &[&str]) -> Result<String, StoreError> {
        debug!(?args, workdir = %self.workdir.display(), "Running git");
        let output = Command::new("git")
            .current_dir(&self.workdir)
            .args(args)
            .output();

        match output {
            Ok(output) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                error!(?args, status = ?output.status, stderr = %stderr, "Git exited with non-zero code");
                Err(format!("git {} failed: {}", args.join(" "), stderr).into())
            }
            Err(e) => {
                error!(error = ?e, ?args, "Failed to launch git process");
                Err(format!("failed to launch git: {e}").into())
            }
        }
    }
}

#[async_trait]
impl VcsClient for GitCli {
    async fn remote_url(&self, remote: &str) -> Result<String, StoreError> {
        self.run(&["remote", "get-url", remote])
    }

    async fn current_branch(&self) -> Result<String, StoreError> {
        self.run(&["branch", "--show-current"])
    }

    async fn list_branches(&self) -> Result<Vec<String>, StoreError> {
        let stdout = self.run(&["branch", "--format=%(refname:short)"])?;
        Ok(stdout
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect())
    }

    async fn checkout(&self, branch: &str) -> Result<(), StoreError> {
        self.run(&["checkout", branch]).map(|_| ())
    }

    async fn add(&self, path: &Path) -> Result<(), StoreError> {
        self.run(&["add", &path.to_string_lossy()]).map(|_| ())
    }

    async fn commit(&self, message: &str) -> Result<(), StoreError> {
        self.run(&["commit", "-m", message]).map(|_| ())
    }

    async fn push(&self, remote: &str, branch: &str) -> Result<(), StoreError> {
        self.run(&["push", remote, branch]).map(|_| ())
    }
}
