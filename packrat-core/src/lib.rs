#![doc = "packrat-core: core logic library for packrat."]

//! This crate contains all the logic, data models and pipelines for packrat:
//! scanning a directory tree, deduplicating against the upload ledger,
//! pushing files to an archival service one at a time, rendering the ledger
//! as a static index page and publishing that page through a git remote.
//! The interactive CLI lives in the `packrat` binary crate.
//!
//! # Usage
//! Add this as a dependency for all shared pipeline, ledger, publishing and
//! config code. External collaborators (archival service, git, the publish
//! state file) are reached only through the traits in [`contract`], so every
//! workflow is testable with the generated mocks.

pub mod archive;
pub mod config;
pub mod contract;
pub mod hash;
pub mod ledger;
pub mod publish;
pub mod scan;
pub mod site;
pub mod state;
pub mod upload;
pub mod vcs;
