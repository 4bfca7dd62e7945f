//! Persisted publish state.
//!
//! A run that renders the index page but never pushes it must leave a durable
//! marker behind so the next run can offer to retry the publish without
//! redoing any uploads. The production store persists the marker as a
//! sentinel file whose content is an informational timestamp; the in-memory
//! store exists for tests and dry runs.

use chrono::Local;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::debug;

use crate::contract::{StateStore, StoreError};

/// Whether rendered output exists that has not been confirmed pushed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PublishState {
    #[default]
    Clean,
    PendingPublish,
}

/// Sentinel-file store: the state is the existence of the file.
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StateStore for FileStateStore {
    fn load(&self) -> PublishState {
        if self.path.exists() {
            PublishState::PendingPublish
        } else {
            PublishState::Clean
        }
    }

    fn set_pending(&self) -> Result<(), StoreError> {
        // The timestamp is informational only; existence is the state.
        fs::write(&self.path, Local::now().to_rfc3339())?;
        debug!(path = %self.path.display(), "Set pending-publish flag");
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        debug!(path = %self.path.display(), "Cleared pending-publish flag");
        Ok(())
    }
}

/// In-memory store for tests and dry runs.
#[derive(Default)]
pub struct MemoryStateStore {
    state: Mutex<PublishState>,
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> PublishState {
        *self.state.lock().expect("state lock poisoned")
    }

    fn set_pending(&self) -> Result<(), StoreError> {
        *self.state.lock().expect("state lock poisoned") = PublishState::PendingPublish;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.state.lock().expect("state lock poisoned") = PublishState::Clean;
        Ok(())
    }
}
