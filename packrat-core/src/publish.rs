//! Publishing the rendered page through a version-control remote.
//!
//! The publish sequence is resumable across runs: rendering the page sets the
//! pending-publish state, and only a confirmed push clears it. A run that
//! crashes or fails mid-push leaves the state pending, which
//! [`offer_publish_retry`] detects on the next startup so the orchestrator
//! can offer to retry without redoing any uploads.
//!
//! Remote misconfiguration (no remote, unparseable URL) is a pre-flight
//! error: it aborts with guidance and leaves the state untouched, because
//! retrying cannot fix configuration.

use regex::Regex;
use std::fmt;
use std::path::Path;
use tracing::{error, info, warn};

use crate::contract::{StateStore, StoreError, VcsClient};
use crate::state::PublishState;

/// Conventional pages branch, preferred when it exists.
pub const PAGES_BRANCH: &str = "gh-pages";
/// Fallback publish branch.
pub const DEFAULT_BRANCH: &str = "main";

/// Owner and repository name extracted from a GitHub remote URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRepo {
    pub owner: String,
    pub name: String,
}

impl RemoteRepo {
    /// Parse both HTTPS (`https://github.com/owner/repo`) and SSH
    /// (`git@github.com:owner/repo.git`) URL forms.
    pub fn parse(url: &str) -> Option<Self> {
        let pattern = Regex::new(r"(?:https://github\.com/|git@github\.com:)([^/]+)/([^/.]+)")
            .expect("static regex");
        let captures = pattern.captures(url)?;
        Some(Self {
            owner: captures[1].to_string(),
            name: captures[2].to_string(),
        })
    }

    /// The GitHub Pages URL the published page will be served from.
    pub fn pages_url(&self) -> String {
        format!("https://{}.github.io/{}/", self.owner, self.name)
    }
}

/// Successful publish: where the page went.
#[derive(Debug)]
pub struct PagesInfo {
    pub repo: RemoteRepo,
    pub branch: String,
}

#[derive(Debug)]
pub enum PublishError {
    /// No usable remote. Pre-flight: the pending state is left untouched.
    NoRemote(String),
    /// The remote URL matched neither supported form. Also pre-flight.
    UnparseableRemote(String),
    /// A version-control operation failed after pre-flight; the pending
    /// state has been (re-)asserted.
    Vcs(StoreError),
    /// The state store itself failed.
    State(StoreError),
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishError::NoRemote(detail) => write!(
                f,
                "no usable git remote ({detail}); run `git init` and \
                 `git remote add origin <url>` in this directory first"
            ),
            PublishError::UnparseableRemote(url) => write!(
                f,
                "could not parse GitHub URL `{url}`; expected \
                 https://github.com/owner/repo or git@github.com:owner/repo.git"
            ),
            PublishError::Vcs(e) => write!(f, "publish failed: {e}"),
            PublishError::State(e) => write!(f, "publish state error: {e}"),
        }
    }
}

impl std::error::Error for PublishError {}

impl PublishError {
    /// `true` when the failure was pre-flight misconfiguration, i.e. the
    /// pending state was left untouched and retrying cannot help.
    pub fn is_preflight(&self) -> bool {
        matches!(
            self,
            PublishError::NoRemote(_) | PublishError::UnparseableRemote(_)
        )
    }
}

/// Prefer the conventional pages branch when it exists.
pub fn choose_branch(branches: &[String]) -> String {
    if branches.iter().any(|branch| branch == PAGES_BRANCH) {
        PAGES_BRANCH.to_string()
    } else {
        DEFAULT_BRANCH.to_string()
    }
}

/// Whether startup should offer a publish retry: a prior run rendered the
/// page and never confirmed the push.
pub fn offer_publish_retry(state: &dyn StateStore, site_path: &Path) -> bool {
    state.load() == PublishState::PendingPublish && site_path.exists()
}

/// Stage, commit and push the rendered page.
///
/// `confirm_switch` is consulted when the current branch differs from the
/// publish branch; returning `true` checks the publish branch out first,
/// returning `false` keeps working from the current branch. Any failure
/// after pre-flight re-asserts the pending state and propagates.
pub async fn publish_site<V, S>(
    vcs: &V,
    state: &S,
    site_path: &Path,
    confirm_switch: impl Fn(&str, &str) -> bool,
) -> Result<PagesInfo, PublishError>
where
    V: VcsClient,
    S: StateStore,
{
    // Pre-flight: resolve and parse the remote before touching anything.
    let url = vcs
        .remote_url("origin")
        .await
        .map_err(|e| PublishError::NoRemote(e.to_string()))?;
    let repo = RemoteRepo::parse(&url).ok_or_else(|| PublishError::UnparseableRemote(url))?;
    info!(pages_url = %repo.pages_url(), "Resolved GitHub Pages target");

    let pushed: Result<String, PublishError> = async {
        let branches = vcs.list_branches().await.map_err(PublishError::Vcs)?;
        let target = choose_branch(&branches);
        let current = vcs.current_branch().await.map_err(PublishError::Vcs)?;
        if current != target {
            warn!(
                current = %current,
                target = %target,
                "Current branch differs from publish branch"
            );
            if confirm_switch(&current, &target) {
                vcs.checkout(&target).await.map_err(PublishError::Vcs)?;
            }
        }

        info!(path = %site_path.display(), "Committing rendered page");
        vcs.add(site_path).await.map_err(PublishError::Vcs)?;
        vcs.commit("Update archive index page")
            .await
            .map_err(PublishError::Vcs)?;

        info!(branch = %target, "Pushing to remote");
        vcs.push("origin", &target).await.map_err(PublishError::Vcs)?;
        Ok(target)
    }
    .await;

    match pushed {
        Ok(branch) => {
            state.clear().map_err(PublishError::State)?;
            info!(branch = %branch, pages_url = %repo.pages_url(), "Publish succeeded");
            Ok(PagesInfo { repo, branch })
        }
        Err(e) => {
            error!(error = %e, "Publish failed, keeping pending-publish state");
            // The next run must be offered a retry.
            if let Err(state_err) = state.set_pending() {
                error!(error = %state_err, "Failed to re-assert pending-publish state");
            }
            Err(e)
        }
    }
}
