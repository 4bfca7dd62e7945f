//! Append-only upload ledger and failure log.
//!
//! The ledger is the source of truth for deduplication and for site
//! generation: one pipe-separated line per successfully uploaded file, never
//! rewritten. The reader is tolerant — a line with the wrong field count
//! (including a partial last line from a crash) is skipped without failing
//! the parse of subsequent lines. The failure log records items that
//! exhausted their retry budget; the program only ever writes it.

use chrono::Local;
use std::collections::HashSet;
use std::fmt;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::RunConfig;

const LEDGER_FIELDS: usize = 5;

/// One successfully completed upload. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub item_id: String,
    pub uploader: String,
    /// Forward-slash normalized path relative to the uploaded root.
    pub relative_path: String,
    pub content_hash: String,
    /// ISO-8601 timestamp of the upload.
    pub timestamp: String,
}

impl LedgerEntry {
    pub fn new(item_id: &str, uploader: &str, relative_path: &str, content_hash: &str) -> Self {
        Self {
            item_id: item_id.to_string(),
            uploader: uploader.to_string(),
            relative_path: relative_path.to_string(),
            content_hash: content_hash.to_string(),
            timestamp: Local::now().to_rfc3339(),
        }
    }

    fn parse(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.trim_end().split('|').collect();
        if fields.len() != LEDGER_FIELDS {
            return None;
        }
        Some(Self {
            item_id: fields[0].to_string(),
            uploader: fields[1].to_string(),
            relative_path: fields[2].to_string(),
            content_hash: fields[3].to_string(),
            timestamp: fields[4].to_string(),
        })
    }

    fn to_line(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.item_id, self.uploader, self.relative_path, self.content_hash, self.timestamp
        )
    }
}

/// One item that exhausted its retry budget. Diagnostic only.
#[derive(Debug, Clone)]
pub struct FailureRecord {
    pub timestamp: String,
    pub item_id: String,
    pub relative_path: String,
    pub content_hash: String,
    pub error: String,
}

impl FailureRecord {
    pub fn new(item_id: &str, relative_path: &str, content_hash: &str, error: &str) -> Self {
        Self {
            timestamp: Local::now().to_rfc3339(),
            item_id: item_id.to_string(),
            relative_path: relative_path.to_string(),
            content_hash: content_hash.to_string(),
            error: error.to_string(),
        }
    }

    fn to_line(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.timestamp, self.item_id, self.relative_path, self.content_hash, self.error
        )
    }
}

#[derive(Debug)]
pub enum LedgerError {
    Io(std::io::Error),
}

impl From<std::io::Error> for LedgerError {
    fn from(e: std::io::Error) -> Self {
        LedgerError::Io(e)
    }
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::Io(e) => write!(f, "ledger I/O error: {e}"),
        }
    }
}

impl std::error::Error for LedgerError {}

/// Handle over the ledger file and the failure log.
pub struct Ledger {
    path: PathBuf,
    failure_path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>, failure_path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            failure_path: failure_path.into(),
        }
    }

    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(&config.ledger_path, &config.failure_log_path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All well-formed entries, in file order. A missing ledger file means an
    /// empty ledger, not an error.
    pub fn read_entries(&self) -> Result<Vec<LedgerEntry>, LedgerError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No ledger file yet, treating as empty");
            return Ok(Vec::new());
        }
        let file = std::fs::File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match LedgerEntry::parse(&line) {
                Some(entry) => entries.push(entry),
                None => warn!(line = %line, "Skipping malformed ledger line"),
            }
        }
        Ok(entries)
    }

    /// Hash-set projection of the content-hash field, for dedup lookups.
    pub fn uploaded_hashes(&self) -> Result<HashSet<String>, LedgerError> {
        Ok(self
            .read_entries()?
            .into_iter()
            .map(|entry| entry.content_hash)
            .collect())
    }

    /// Append one entry: open, append, flush, close. Prior lines are never
    /// rewritten, so a crash can only ever truncate the line being written,
    /// which the tolerant reader then skips.
    pub fn append(&self, entry: &LedgerEntry) -> Result<(), LedgerError> {
        append_line(&self.path, &entry.to_line())?;
        debug!(
            path = %entry.relative_path,
            hash = %entry.content_hash,
            "Appended ledger entry"
        );
        Ok(())
    }

    /// Append one failure record with the same durability discipline.
    pub fn append_failure(&self, record: &FailureRecord) -> Result<(), LedgerError> {
        append_line(&self.failure_path, &record.to_line())?;
        debug!(path = %record.relative_path, "Appended failure record");
        Ok(())
    }
}

fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")?;
    file.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn ledger_in(dir: &Path) -> Ledger {
        Ledger::new(dir.join("uploaded.log"), dir.join("Failed.log"))
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_in(dir.path());
        assert!(ledger.read_entries().unwrap().is_empty());
        assert!(ledger.uploaded_hashes().unwrap().is_empty());
    }

    #[test]
    fn append_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_in(dir.path());

        let entry = LedgerEntry::new("item1", "alice", "docs/a.txt", "HASH1");
        ledger.append(&entry).unwrap();
        ledger
            .append(&LedgerEntry::new("item1", "alice", "docs/b.txt", "HASH2"))
            .unwrap();

        let entries = ledger.read_entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].item_id, "item1");
        assert_eq!(entries[0].relative_path, "docs/a.txt");
        assert_eq!(entries[0].content_hash, "HASH1");
        assert_eq!(entries[0].timestamp, entry.timestamp);

        let hashes = ledger.uploaded_hashes().unwrap();
        assert!(hashes.contains("HASH1"));
        assert!(hashes.contains("HASH2"));
    }

    #[test]
    fn malformed_lines_are_skipped_without_error() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_in(dir.path());
        fs::write(
            ledger.path(),
            "item1|alice|a/b.txt|HASH1|T1\n\
             only|three|fields\n\
             item1|alice|a/c.txt|HASH2|T2\n\
             item1|alice|a/d.txt|HASH3|T3|extra\n\
             item1|alice|trunc",
        )
        .unwrap();

        let entries = ledger.read_entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].content_hash, "HASH1");
        assert_eq!(entries[1].content_hash, "HASH2");
    }

    #[test]
    fn line_format_is_pipe_separated_five_fields() {
        let entry = LedgerEntry {
            item_id: "item1".into(),
            uploader: "alice".into(),
            relative_path: "a/b.txt".into(),
            content_hash: "HASH1".into(),
            timestamp: "T1".into(),
        };
        assert_eq!(entry.to_line(), "item1|alice|a/b.txt|HASH1|T1");
    }

    #[test]
    fn failure_records_land_in_the_failure_log_only() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_in(dir.path());
        ledger
            .append_failure(&FailureRecord::new(
                "item1",
                "a/b.txt",
                "HASH1",
                "connection reset",
            ))
            .unwrap();

        assert!(ledger.read_entries().unwrap().is_empty());
        let log = fs::read_to_string(dir.path().join("Failed.log")).unwrap();
        assert!(log.contains("item1|a/b.txt|HASH1|connection reset"));
    }
}
