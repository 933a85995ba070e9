//! Batch media download orchestration around an external yt-dlp style tool.
//!
//! A batch of URLs is run strictly in order; each URL goes through up to ten
//! attempts with escalating authentication strategies, the tool's output is
//! parsed for progress and error signals, and success is judged from
//! filesystem evidence before the exit code. Permanently failed URLs are
//! appended to a CSV journal.

pub mod config;
pub mod logging;

pub mod auth;
pub mod batch;
pub mod control;
pub mod format;
pub mod history;
pub mod journal;
pub mod parse;
pub mod progress;
pub mod retry;
pub mod runner;
pub mod tools;
pub mod url_model;
