//! Journal row model and its CSV column mapping.

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

pub(super) const HEADER: [&str; 4] = ["URL", "Type", "Timestamp", "Error"];
pub(super) const SENTINEL: [&str; 4] = ["---", "---", "---", "---"];

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Longest error text kept per row, in characters.
pub const MAX_ERROR_CHARS: usize = 500;

/// One permanently failed URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub url: String,
    /// Media kind of the batch ("video" or "audio").
    pub item_type: String,
    pub timestamp: NaiveDateTime,
    pub error_summary: String,
}

impl FailureRecord {
    /// Record stamped with the current local time; the error text is
    /// flattened to one line and truncated.
    pub fn now(url: impl Into<String>, item_type: impl Into<String>, error: &str) -> Self {
        // Whole seconds, as stored on disk.
        let now = Local::now().naive_local();
        Self {
            url: url.into(),
            item_type: item_type.into(),
            timestamp: now.with_nanosecond(0).unwrap_or(now),
            error_summary: summarize_error(error),
        }
    }
}

/// A row read back from the journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalRow {
    /// Session delimiter.
    Session,
    Failure(FailureRecord),
}

/// One line, at most [`MAX_ERROR_CHARS`] characters.
pub fn summarize_error(error: &str) -> String {
    let flat = error
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" | ");
    flat.chars().take(MAX_ERROR_CHARS).collect()
}

/// On-disk shape of one journal row; column names match [`HEADER`].
#[derive(Debug, Serialize, Deserialize)]
pub(super) struct CsvRow {
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "Type")]
    pub item_type: String,
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "Error")]
    pub error: String,
}

impl From<&FailureRecord> for CsvRow {
    fn from(record: &FailureRecord) -> Self {
        Self {
            url: record.url.clone(),
            item_type: record.item_type.clone(),
            timestamp: record.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            error: record.error_summary.clone(),
        }
    }
}

impl CsvRow {
    /// Session delimiter, failure, or `None` for rows with a bad timestamp.
    pub(super) fn into_row(self) -> Option<JournalRow> {
        let fields = [&self.url, &self.item_type, &self.timestamp, &self.error];
        if fields.iter().zip(SENTINEL).all(|(f, s)| f.as_str() == s) {
            return Some(JournalRow::Session);
        }
        let timestamp = NaiveDateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT).ok()?;
        Some(JournalRow::Failure(FailureRecord {
            url: self.url,
            item_type: self.item_type,
            timestamp,
            error_summary: self.error,
        }))
    }
}
