//! # contract: trait seams for every external collaborator
//!
//! This module defines the traits through which the core pipeline reaches
//! the outside world: the archival service ([`ArchiveStore`]), the version
//! control CLI ([`VcsClient`]) and the persisted publish state
//! ([`StateStore`]), plus the plain data types they exchange.
//!
//! ## Interface & Extensibility
//! - Implement [`ArchiveStore`] to target a different archival backend.
//! - All service methods are async, returning boxed error trait objects so
//!   implementors can surface transport, subprocess or filesystem failures
//!   uniformly.
//! - Meant for both production code and robust mocking in tests.
//!
//! ## Mocking & Testing
//! - Every trait is annotated for `mockall`, and the generated mocks are
//!   exported under the `test-export-mocks` feature so integration tests can
//!   drive the upload and publish workflows without network or subprocesses.

use async_trait::async_trait;
use std::path::Path;

use mockall::automock;

use crate::state::PublishState;

/// Uniform boxed error type used at every trait seam.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Descriptive metadata attached to a remote item when its first file is
/// uploaded. The archival service creates the item lazily from these fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemMetadata {
    pub title: String,
    pub mediatype: String,
    pub collection: String,
    pub description: String,
    pub creator: String,
    pub subject: String,
    pub license_url: String,
}

impl ItemMetadata {
    /// Metadata for one run, derived from the uploader identity and the
    /// basename of the source directory.
    pub fn for_run(uploader: &str, source_basename: &str, collection: &str) -> Self {
        Self {
            title: format!("{uploader}'s Upload: {source_basename}"),
            mediatype: String::from("data"),
            collection: collection.to_string(),
            description: format!("Uploaded via packrat by {uploader}"),
            creator: uploader.to_string(),
            subject: String::from("user-upload"),
            license_url: String::from("http://creativecommons.org/publicdomain/zero/1.0/"),
        }
    }
}

/// One local file to place into a remote item.
#[derive(Debug)]
pub struct PutRequest<'a> {
    /// Identifier of the remote item (container) receiving the file.
    pub item_id: &'a str,
    /// Forward-slash path of the file inside the item.
    pub remote_path: &'a str,
    /// Local file to read and send.
    pub local_path: &'a Path,
    /// Item metadata, applied by the service on first upload.
    pub metadata: &'a ItemMetadata,
}

/// Trait for the remote archival service.
///
/// The implementor owns transport, authentication and serialization; the
/// pipeline only ever asks it to put one file and treats any error as a
/// failed attempt subject to the retry budget.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    /// Upload one local file into the item, creating the item on first use.
    async fn put_file<'a>(&self, req: PutRequest<'a>) -> Result<(), StoreError>;
}

/// Trait for the version-control remote, reached through opaque pass/fail
/// operations. Implemented by the git CLI wrapper and by test mocks.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait VcsClient: Send + Sync {
    /// URL of the named remote, e.g. `origin`.
    async fn remote_url(&self, remote: &str) -> Result<String, StoreError>;

    /// Name of the branch currently checked out.
    async fn current_branch(&self) -> Result<String, StoreError>;

    /// Short names of all local branches.
    async fn list_branches(&self) -> Result<Vec<String>, StoreError>;

    /// Check out the named branch.
    async fn checkout(&self, branch: &str) -> Result<(), StoreError>;

    /// Stage one path.
    async fn add(&self, path: &Path) -> Result<(), StoreError>;

    /// Commit staged changes with the given message.
    async fn commit(&self, message: &str) -> Result<(), StoreError>;

    /// Push the named branch to the named remote.
    async fn push(&self, remote: &str, branch: &str) -> Result<(), StoreError>;
}

/// Trait for the persisted publish state.
///
/// The flag must survive process restarts: a run that rendered the page but
/// never pushed it leaves `PendingPublish` behind, and the next run offers a
/// retry. The file-backed store persists the state as a sentinel file; tests
/// substitute the in-memory store.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait StateStore: Send + Sync {
    /// Current state; absence of the backing record means [`PublishState::Clean`].
    fn load(&self) -> PublishState;

    /// Record that rendered output exists which has not been pushed.
    fn set_pending(&self) -> Result<(), StoreError>;

    /// Record that the rendered output has been pushed.
    fn clear(&self) -> Result<(), StoreError>;
}
