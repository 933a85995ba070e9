//! Persistent batch history (SQLite via sqlx).
//!
//! One row per submitted batch: what was asked for, where it went, and how
//! it ended. Written at batch start and finish; listed by `mdm status`.

mod batches;
mod db;
mod types;

pub use db::HistoryDb;
pub use types::{BatchRecord, NewBatch};

#[cfg(test)]
mod tests;
