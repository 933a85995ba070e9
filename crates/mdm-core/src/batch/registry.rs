//! In-process table of submitted batches.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tokio::task::JoinHandle;

use super::{Batch, BatchOrchestrator};
use crate::control::JobControl;
use crate::format::MediaFormat;
use crate::progress::{ProgressHandle, ProgressState};
use crate::retry::ConfigError;
use crate::url_model::validate_source_url;

struct JobEntry {
    progress: ProgressHandle,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// Accepts batches, runs each on its own task and serves snapshots.
pub struct JobRegistry {
    orchestrator: Arc<BatchOrchestrator>,
    control: Arc<JobControl>,
    jobs: RwLock<HashMap<String, Arc<JobEntry>>>,
}

/// Aliases for the user's download directory.
const DOWNLOADS_ALIASES: [&str; 2] = ["Downloads", "downloads"];

/// The user's download directory, `~/Downloads` when the platform has none.
pub fn downloads_dir() -> Option<PathBuf> {
    dirs::download_dir().or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
}

/// Maps the `Downloads` alias and `~` to real paths and makes the result
/// absolute against the current directory. Touches nothing on disk.
pub fn expand_output_dir(raw: &str) -> Result<PathBuf, ConfigError> {
    let raw = raw.trim();
    let home_relative = |rest: &str| dirs::home_dir().map(|home| home.join(rest));
    let expanded = if DOWNLOADS_ALIASES.contains(&raw) {
        downloads_dir().unwrap_or_else(|| PathBuf::from(raw))
    } else if raw == "~" {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from(raw))
    } else if let Some(rest) = raw.strip_prefix("~/") {
        home_relative(rest).unwrap_or_else(|| PathBuf::from(raw))
    } else {
        PathBuf::from(raw)
    };
    if expanded.is_absolute() {
        return Ok(expanded);
    }
    let cwd = std::env::current_dir().map_err(|source| ConfigError::OutputDir {
        path: expanded.clone(),
        source,
    })?;
    Ok(cwd.join(expanded))
}

/// [`expand_output_dir`], then creates the directory if missing.
pub async fn resolve_output_dir(raw: &str) -> Result<PathBuf, ConfigError> {
    let absolute = expand_output_dir(raw)?;
    tokio::fs::create_dir_all(&absolute)
        .await
        .map_err(|source| ConfigError::OutputDir {
            path: absolute.clone(),
            source,
        })?;
    Ok(absolute)
}

impl JobRegistry {
    pub fn new(orchestrator: Arc<BatchOrchestrator>) -> Self {
        Self {
            orchestrator,
            control: Arc::new(JobControl::new()),
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Validates the request, then starts the batch on a new task.
    ///
    /// Nothing is spawned when validation fails. Blank URL lines are
    /// ignored; an all-blank list is an empty batch.
    pub async fn submit_batch(
        &self,
        urls: &[String],
        format: &str,
        output_dir: &str,
    ) -> Result<String, ConfigError> {
        let urls: Vec<String> = urls
            .iter()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .collect();
        if urls.is_empty() {
            return Err(ConfigError::EmptyBatch);
        }
        let format: MediaFormat = format.parse()?;
        for url in &urls {
            validate_source_url(url).map_err(|reason| ConfigError::InvalidUrl {
                url: url.clone(),
                reason,
            })?;
        }
        let output_dir = resolve_output_dir(output_dir).await?;

        let job_id = uuid::Uuid::new_v4().to_string();
        let progress = ProgressHandle::new(job_id.clone(), urls.len());
        let token = self.control.register(&job_id);
        let batch = Batch {
            urls,
            format,
            output_dir,
        };

        let task = {
            let orchestrator = Arc::clone(&self.orchestrator);
            let control = Arc::clone(&self.control);
            let progress = progress.clone();
            let job_id = job_id.clone();
            tokio::spawn(async move {
                orchestrator
                    .run_batch(&batch, &progress, Some(token.as_ref()))
                    .await;
                control.unregister(&job_id);
            })
        };

        self.jobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                job_id.clone(),
                Arc::new(JobEntry {
                    progress,
                    task: Mutex::new(Some(task)),
                }),
            );
        tracing::info!(job_id = %job_id, "batch submitted");
        Ok(job_id)
    }

    fn entry(&self, job_id: &str) -> Option<Arc<JobEntry>> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(job_id)
            .cloned()
    }

    /// Snapshot of a batch, `None` for unknown or evicted ids.
    pub fn get_state(&self, job_id: &str) -> Option<ProgressState> {
        self.entry(job_id).map(|e| e.progress.snapshot())
    }

    /// Asks a running batch to stop. False if it is not running.
    pub fn cancel(&self, job_id: &str) -> bool {
        self.control.request_abort(job_id)
    }

    /// Waits for the batch task to end and returns the final snapshot.
    pub async fn wait(&self, job_id: &str) -> Option<ProgressState> {
        let entry = self.entry(job_id)?;
        let task = entry
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::error!(job_id, "batch task failed: {}", e);
                entry.progress.abandon("Internal error");
            }
        }
        Some(entry.progress.snapshot())
    }

    /// Drops a finished batch from the table. Running batches are kept.
    pub fn evict(&self, job_id: &str) -> bool {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        let terminal = jobs
            .get(job_id)
            .map(|e| e.progress.snapshot().phase.is_terminal())
            .unwrap_or(false);
        if terminal {
            jobs.remove(job_id);
        }
        terminal
    }

    /// Ids of all known batches.
    pub fn job_ids(&self) -> Vec<String> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}
