//! The per-batch progress record and its transitions.

use serde::{Deserialize, Serialize};

/// Lifecycle phase of a batch job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobPhase {
    Queued,
    Running,
    Complete,
    Failed,
}

impl JobPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            JobPhase::Queued => "queued",
            JobPhase::Running => "running",
            JobPhase::Complete => "complete",
            JobPhase::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "queued" => JobPhase::Queued,
            "running" => JobPhase::Running,
            "complete" => JobPhase::Complete,
            _ => JobPhase::Failed,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobPhase::Complete | JobPhase::Failed)
    }
}

/// Status of one batch job as seen by pollers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressState {
    pub job_id: String,
    /// Number of URLs in the batch (fixed at creation).
    pub total_items: usize,
    /// 1-based position of the URL being processed (0 before the first).
    pub current_index: usize,
    /// Batch progress in [0, 100]; never decreases.
    pub overall_progress: f64,
    /// Progress of the current URL in [0, 100]; reset for every URL.
    pub current_item_progress: f64,
    pub phase: JobPhase,
    pub status_message: String,
    pub current_item_message: String,
    /// URLs that exhausted every attempt, in processing order.
    pub failed_items: Vec<String>,
}

impl ProgressState {
    pub fn new(job_id: impl Into<String>, total_items: usize) -> Self {
        Self {
            job_id: job_id.into(),
            total_items,
            current_index: 0,
            overall_progress: 0.0,
            current_item_progress: 0.0,
            phase: JobPhase::Queued,
            status_message: "Queued".to_string(),
            current_item_message: String::new(),
            failed_items: Vec::new(),
        }
    }

    fn percent_of_total(&self, done: usize) -> f64 {
        if self.total_items == 0 {
            return 0.0;
        }
        done as f64 / self.total_items as f64 * 100.0
    }

    fn raise_overall(&mut self, value: f64) {
        if value > self.overall_progress {
            self.overall_progress = value;
        }
    }

    pub(crate) fn start(&mut self) {
        self.phase = JobPhase::Running;
        self.status_message = format!("Starting {} item(s)...", self.total_items);
    }

    /// Enter URL `index` (0-based).
    pub(crate) fn begin_item(&mut self, index: usize) {
        self.current_index = (index + 1).min(self.total_items);
        let overall = self.percent_of_total(index);
        self.raise_overall(overall);
        self.current_item_progress = 0.0;
        self.current_item_message.clear();
        self.status_message = format!(
            "Downloading {} of {}...",
            self.current_index, self.total_items
        );
    }

    pub(crate) fn set_item_progress(&mut self, percent: f64) {
        let percent = percent.clamp(0.0, 100.0);
        self.current_item_progress = percent;
        self.current_item_message = format!("Download: {:.1}%", percent);
    }

    /// URL `index` finished successfully.
    ///
    /// The last item does not move `overall_progress`; 100 is reserved for
    /// `finish`, which sets it together with the `complete` phase.
    pub(crate) fn complete_item(&mut self, index: usize) {
        self.current_item_progress = 100.0;
        if index + 1 < self.total_items {
            let overall = self.percent_of_total(index + 1);
            self.raise_overall(overall);
        }
    }

    pub(crate) fn record_failure(&mut self, url: &str) {
        self.failed_items.push(url.to_string());
    }

    pub(crate) fn finish(&mut self) {
        self.phase = JobPhase::Complete;
        self.overall_progress = 100.0;
        self.status_message = format!("Completed! Failed: {}", self.failed_items.len());
    }

    /// Terminal stop before all URLs were processed (cancellation).
    pub(crate) fn abandon(&mut self, reason: &str) {
        self.phase = JobPhase::Failed;
        self.status_message = reason.to_string();
    }
}
