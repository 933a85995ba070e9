//! Batch execution: sequences a batch's URLs through the runner and keeps
//! the batch's progress record current.

mod registry;

pub use registry::{downloads_dir, expand_output_dir, resolve_output_dir, JobRegistry};

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::auth::AuthStrategyProvider;
use crate::config::MdmConfig;
use crate::control::is_aborted;
use crate::format::{FormatPolicy, MediaFormat};
use crate::history::{HistoryDb, NewBatch};
use crate::journal::FailureJournal;
use crate::progress::{ProgressHandle, ProgressState};
use crate::retry::ItemError;
use crate::runner::{RetryingDownloadRunner, RunRequest};

/// A validated batch.
#[derive(Debug, Clone)]
pub struct Batch {
    pub urls: Vec<String>,
    pub format: MediaFormat,
    /// Absolute and existing.
    pub output_dir: PathBuf,
}

pub struct BatchOrchestrator {
    runner: RetryingDownloadRunner,
    merge_tool: PathBuf,
    detect_browser_cookies: bool,
    history: Option<HistoryDb>,
}

impl BatchOrchestrator {
    pub fn new(runner: RetryingDownloadRunner, merge_tool: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            merge_tool: merge_tool.into(),
            detect_browser_cookies: true,
            history: None,
        }
    }

    pub fn from_config(
        cfg: &MdmConfig,
        auth: Arc<AuthStrategyProvider>,
        journal: Arc<FailureJournal>,
    ) -> Self {
        Self::new(
            RetryingDownloadRunner::from_config(cfg, auth, journal),
            &cfg.merge_tool_path,
        )
        .with_browser_detection(cfg.detect_browser_cookies)
    }

    /// Whether to probe browsers for session cookies at batch start.
    pub fn with_browser_detection(mut self, enabled: bool) -> Self {
        self.detect_browser_cookies = enabled;
        self
    }

    pub fn with_history(mut self, history: HistoryDb) -> Self {
        self.history = Some(history);
        self
    }

    pub fn runner(&self) -> &RetryingDownloadRunner {
        &self.runner
    }

    /// Runs every URL of `batch` exactly once, in order.
    ///
    /// A URL that exhausts its attempts is added to `failed_items` and the
    /// batch moves on. The batch ends in `complete` unless `abort` is set,
    /// in which case it stops before the next attempt or URL and ends in
    /// `failed`. Returns the final snapshot.
    pub async fn run_batch(
        &self,
        batch: &Batch,
        progress: &ProgressHandle,
        abort: Option<&AtomicBool>,
    ) -> ProgressState {
        let job_id = progress.job_id();
        let total = batch.urls.len();
        tracing::info!(job_id = %job_id, total, format = %batch.format, "batch started");

        if let Err(e) = self.runner.journal().begin_session() {
            tracing::error!("cannot write journal session marker: {:#}", e);
        }
        progress.start();
        self.record_started(&job_id, batch).await;

        let policy = self.detect_policy().await;
        tracing::info!(job_id = %job_id, ?policy, "format policy");

        if self.detect_browser_cookies {
            self.runner.auth().detect_browser(false).await;
            tracing::info!("{}", self.runner.auth().user_message());
        }

        for (index, url) in batch.urls.iter().enumerate() {
            if is_aborted(abort) {
                return self.cancel(progress).await;
            }
            progress.begin_item(index);
            let request = RunRequest {
                url,
                format: batch.format,
                policy,
                output_dir: &batch.output_dir,
                progress,
                abort,
            };
            match self.runner.run(&request).await {
                Ok(()) => progress.complete_item(index),
                Err(ItemError::Exhausted(e)) => {
                    tracing::warn!(job_id = %job_id, url = %url, "item failed: {}", e.message);
                    progress.record_failure(url);
                }
                Err(ItemError::Aborted) => return self.cancel(progress).await,
            }
        }

        progress.finish();
        let state = progress.snapshot();
        tracing::info!(
            job_id = %job_id,
            failed = state.failed_items.len(),
            "batch complete"
        );
        self.record_finished(&state).await;
        state
    }

    /// Re-checked for every batch; the merge tool may have been installed
    /// or removed since the last one.
    async fn detect_policy(&self) -> FormatPolicy {
        let merge_tool = self.merge_tool.clone();
        tokio::task::spawn_blocking(move || FormatPolicy::detect(&merge_tool))
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("merge tool check failed: {}", e);
                FormatPolicy::ProgressiveOnly
            })
    }

    async fn cancel(&self, progress: &ProgressHandle) -> ProgressState {
        progress.abandon("Cancelled");
        let state = progress.snapshot();
        tracing::info!(job_id = %state.job_id, "batch cancelled");
        self.record_finished(&state).await;
        state
    }

    async fn record_started(&self, job_id: &str, batch: &Batch) {
        let Some(history) = &self.history else {
            return;
        };
        let row = NewBatch {
            job_id: job_id.to_string(),
            format: batch.format.to_string(),
            output_dir: batch.output_dir.clone(),
            urls: batch.urls.clone(),
        };
        if let Err(e) = history.record_started(&row).await {
            tracing::warn!("cannot record batch history: {:#}", e);
        }
    }

    async fn record_finished(&self, state: &ProgressState) {
        if let Some(history) = &self.history {
            if let Err(e) = history.record_finished(state).await {
                tracing::warn!("cannot record batch history: {:#}", e);
            }
        }
    }
}
