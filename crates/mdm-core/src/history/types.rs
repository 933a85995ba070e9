use std::path::PathBuf;

use serde::Serialize;

use crate::progress::JobPhase;

/// Batch as submitted, recorded when it starts.
#[derive(Debug, Clone)]
pub struct NewBatch {
    pub job_id: String,
    pub format: String,
    pub output_dir: PathBuf,
    pub urls: Vec<String>,
}

/// Row of the history table.
#[derive(Debug, Clone, Serialize)]
pub struct BatchRecord {
    pub job_id: String,
    pub format: String,
    pub output_dir: String,
    pub total_items: i64,
    pub urls: Vec<String>,
    pub failed_items: Vec<String>,
    pub phase: JobPhase,
    pub message: String,
    pub created_at: i64,
    pub finished_at: Option<i64>,
}
