//! Drives one URL through escalating attempts until a file lands or the
//! budget runs out.

mod attempt;
mod command;
mod evidence;
mod sidecar;

pub use attempt::ProcessOutcome;
pub use command::{ToolCommand, OUTPUT_TEMPLATE};
pub use evidence::{judge, DirSnapshot, Evidence, EvidenceInput};
pub use sidecar::remove_image_sidecars;

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::AuthStrategyProvider;
use crate::config::MdmConfig;
use crate::control::is_aborted;
use crate::format::{FormatPolicy, MediaFormat};
use crate::journal::{FailureJournal, FailureRecord};
use crate::progress::ProgressHandle;
use crate::retry::{AttemptError, ExhaustedError, ItemError, RetryDecision, RetryPolicy};
use crate::url_model::normalize_url;

const ABORT_POLL: Duration = Duration::from_millis(100);

/// Runner settings derived from config.
#[derive(Debug, Clone)]
pub struct RunnerSettings {
    pub downloader: PathBuf,
    pub cache_dir: PathBuf,
    /// Ceiling for one tool run.
    pub attempt_timeout: Duration,
}

impl RunnerSettings {
    pub fn from_config(cfg: &MdmConfig) -> Self {
        Self {
            downloader: PathBuf::from(&cfg.downloader_path),
            cache_dir: cfg.effective_cache_dir(),
            attempt_timeout: cfg.attempt_timeout(),
        }
    }
}

/// One URL to download.
pub struct RunRequest<'a> {
    pub url: &'a str,
    pub format: MediaFormat,
    /// Decided once per batch.
    pub policy: FormatPolicy,
    pub output_dir: &'a Path,
    pub progress: &'a ProgressHandle,
    pub abort: Option<&'a AtomicBool>,
}

pub struct RetryingDownloadRunner {
    settings: RunnerSettings,
    auth: Arc<AuthStrategyProvider>,
    journal: Arc<FailureJournal>,
    policy: RetryPolicy,
}

impl RetryingDownloadRunner {
    pub fn new(
        settings: RunnerSettings,
        auth: Arc<AuthStrategyProvider>,
        journal: Arc<FailureJournal>,
    ) -> Self {
        Self {
            settings,
            auth,
            journal,
            policy: RetryPolicy::default(),
        }
    }

    pub fn from_config(
        cfg: &MdmConfig,
        auth: Arc<AuthStrategyProvider>,
        journal: Arc<FailureJournal>,
    ) -> Self {
        Self::new(RunnerSettings::from_config(cfg), auth, journal)
            .with_policy(RetryPolicy::from_config(cfg))
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn auth(&self) -> &Arc<AuthStrategyProvider> {
        &self.auth
    }

    pub fn journal(&self) -> &Arc<FailureJournal> {
        &self.journal
    }

    /// Downloads `req.url` into `req.output_dir`.
    ///
    /// Each attempt uses the next strategy of the escalation table. Only
    /// `current_item_progress` and `current_item_message` of the progress
    /// record are touched. After the last failed attempt the URL is
    /// journaled and `ItemError::Exhausted` carries the last error text.
    pub async fn run(&self, req: &RunRequest<'_>) -> Result<(), ItemError> {
        let url = normalize_url(req.url);
        if url != req.url {
            tracing::debug!(original = req.url, normalized = %url, "stripped time offset");
        }
        let max = self.policy.max_attempts;
        let mut attempt = 1u32;

        let last_error = loop {
            if is_aborted(req.abort) {
                return Err(ItemError::Aborted);
            }
            let strategy = self.auth.build_args(attempt);
            tracing::info!(
                url = %url,
                attempt,
                max,
                strategy = %strategy.description,
                "starting attempt"
            );
            req.progress
                .set_item_message(format!("Attempt {}/{}: {}", attempt, max, strategy.description));

            let command = ToolCommand::build(
                &self.settings.downloader,
                &self.settings.cache_dir,
                &url,
                &req.format,
                req.policy,
                req.output_dir,
                &strategy,
            );
            let err = match self.attempt(&command, req).await {
                Ok(evidence) => {
                    tracing::info!(url = %url, attempt, ?evidence, "download succeeded");
                    return Ok(());
                }
                Err(e) => e,
            };
            let text = surfaced_text(&err);
            tracing::warn!(url = %url, attempt, "attempt failed: {}", text);

            match self.policy.decide(attempt) {
                RetryDecision::NoRetry => break text,
                RetryDecision::RetryAfter(delay) => {
                    req.progress.set_item_message(format!(
                        "Attempt {} failed, retrying in {:.0} s",
                        attempt,
                        delay.as_secs_f64()
                    ));
                    if !sleep_unless_aborted(delay, req.abort).await {
                        return Err(ItemError::Aborted);
                    }
                    attempt += 1;
                }
            }
        };

        tracing::error!(url = %url, attempts = attempt, "download exhausted: {}", last_error);
        let record = FailureRecord::now(url.clone(), req.format.kind().as_str(), &last_error);
        if let Err(e) = self.journal.append(&record) {
            tracing::error!("cannot write failure journal: {:#}", e);
        }
        Err(ItemError::Exhausted(ExhaustedError {
            url,
            attempts: attempt,
            message: last_error,
        }))
    }

    /// One tool run plus the evidence checks.
    async fn attempt(
        &self,
        command: &ToolCommand,
        req: &RunRequest<'_>,
    ) -> Result<Evidence, AttemptError> {
        let before = DirSnapshot::capture(req.output_dir);
        let outcome =
            attempt::run_process(command, self.settings.attempt_timeout, req.progress).await?;
        let after = DirSnapshot::capture(req.output_dir);

        if !req.format.supports_embedded_artwork() {
            remove_image_sidecars(req.output_dir, &before, &after);
        }

        let signals = &outcome.signals;
        if signals.soft_error {
            tracing::debug!("post-processing reported an error");
        }
        let input = EvidenceInput {
            output_dir: req.output_dir,
            before: &before,
            after: &after,
            destination: signals.destination.as_deref(),
            exit_success: outcome.exit_success(),
            extensions: req.format.kind().artifact_extensions(),
        };
        judge(&input).ok_or_else(|| AttemptError::Failed {
            exit_code: outcome.exit_code,
            message: signals.error_text(),
        })
    }
}

/// Text reported for a failed attempt. For tool failures this is what the
/// tool printed (bot-detection template first), without a prefix.
fn surfaced_text(err: &AttemptError) -> String {
    match err {
        AttemptError::Failed { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

/// Sleeps `delay`; returns false as soon as the token is set.
async fn sleep_unless_aborted(delay: Duration, abort: Option<&AtomicBool>) -> bool {
    let Some(token) = abort else {
        tokio::time::sleep(delay).await;
        return true;
    };
    let deadline = tokio::time::Instant::now() + delay;
    loop {
        if is_aborted(Some(token)) {
            return false;
        }
        let now = tokio::time::Instant::now();
        if now >= deadline {
            return true;
        }
        tokio::time::sleep((deadline - now).min(ABORT_POLL)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn abort_interrupts_backoff() {
        let token = AtomicBool::new(true);
        let started = std::time::Instant::now();
        assert!(!sleep_unless_aborted(Duration::from_secs(5), Some(&token)).await);
        assert!(started.elapsed() < Duration::from_secs(1));
        token.store(false, Ordering::Relaxed);
        assert!(sleep_unless_aborted(Duration::from_millis(10), Some(&token)).await);
        assert!(sleep_unless_aborted(Duration::ZERO, None).await);
    }

    #[test]
    fn failed_attempt_text_has_no_prefix() {
        let err = AttemptError::Failed {
            exit_code: Some(1),
            message: "ERROR: Video unavailable".to_string(),
        };
        assert_eq!(surfaced_text(&err), "ERROR: Video unavailable");
        assert_eq!(
            surfaced_text(&AttemptError::TimedOut(1800)),
            "attempt timed out after 1800 s"
        );
    }
}
