//! Append-only CSV journal of permanently failed downloads.
//!
//! Layout: a `URL,Type,Timestamp,Error` header written once when the file is
//! created, then for every batch a `---,---,---,---` session row followed by
//! one row per exhausted URL. Rows are never rewritten or removed.

mod record;

pub use record::{
    summarize_error, FailureRecord, JournalRow, MAX_ERROR_CHARS, TIMESTAMP_FORMAT,
};

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::config::MdmConfig;
use record::CsvRow;

pub const DEFAULT_FILE_NAME: &str = "failed_downloads.csv";

/// Handle to the journal file. Appends from concurrent batches are
/// serialized so rows never interleave.
#[derive(Debug)]
pub struct FailureJournal {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FailureJournal {
    /// Opens (or creates, with header) the journal at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("create journal dir {}", parent.display()))?;
        }
        let needs_header = fs::metadata(&path).map(|m| m.len() == 0).unwrap_or(true);
        if needs_header {
            let mut w = open_writer(&path)?;
            w.write_record(record::HEADER)?;
            w.flush()?;
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Journal at `journal_path` from config, or `failed_downloads.csv` in
    /// the state directory.
    pub fn open_default(cfg: &MdmConfig) -> Result<Self> {
        let path = match &cfg.journal_path {
            Some(p) => p.clone(),
            None => crate::logging::state_dir()?.join(DEFAULT_FILE_NAME),
        };
        Self::open(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the session delimiter row that starts a batch.
    pub fn begin_session(&self) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut w = open_writer(&self.path)?;
        w.write_record(record::SENTINEL)?;
        w.flush()?;
        Ok(())
    }

    pub fn append(&self, failure: &FailureRecord) -> Result<()> {
        {
            let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
            let mut w = open_writer(&self.path)?;
            w.serialize(CsvRow::from(failure))?;
            w.flush()?;
        }
        tracing::debug!(url = %failure.url, "journaled failed download");
        Ok(())
    }

    /// All sessions and failures in file order. Unreadable lines are skipped.
    pub fn read_rows(&self) -> Result<Vec<JournalRow>> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("read journal {}", self.path.display()))
            }
        };
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(file);
        let mut rows = Vec::new();
        for result in rdr.deserialize::<CsvRow>() {
            match result {
                Ok(row) => rows.extend(row.into_row()),
                Err(e) => tracing::debug!("skipping unreadable journal row: {}", e),
            }
        }
        Ok(rows)
    }

    /// Failures only, oldest first.
    pub fn failures(&self) -> Result<Vec<FailureRecord>> {
        Ok(self
            .read_rows()?
            .into_iter()
            .filter_map(|row| match row {
                JournalRow::Failure(r) => Some(r),
                JournalRow::Session => None,
            })
            .collect())
    }
}

/// Appending writer; the header is written by `open` only.
fn open_writer(path: &Path) -> Result<csv::Writer<File>> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open journal {}", path.display()))?;
    Ok(csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file))
}
