//! `mdm download <urls...>` – run one batch in the foreground and report progress.

use anyhow::{bail, Context, Result};
use mdm_core::auth::AuthStrategyProvider;
use mdm_core::batch::{BatchOrchestrator, JobRegistry};
use mdm_core::config::MdmConfig;
use mdm_core::history::HistoryDb;
use mdm_core::journal::FailureJournal;
use mdm_core::progress::{JobPhase, ProgressState};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Options for one foreground batch.
#[derive(Debug)]
pub struct DownloadArgs {
    pub urls: Vec<String>,
    pub format: String,
    pub output_dir: PathBuf,
    pub po_token: Option<String>,
    pub browser_cookies: bool,
    pub json: bool,
}

pub async fn run_download(cfg: &MdmConfig, args: DownloadArgs) -> Result<()> {
    let auth = Arc::new(AuthStrategyProvider::from_config(cfg));
    if let Some(token) = args.po_token.as_deref() {
        auth.set_bot_bypass_token(token);
    }
    let journal = Arc::new(FailureJournal::open_default(cfg).context("open failure journal")?);

    let mut orchestrator = BatchOrchestrator::from_config(cfg, auth, journal)
        .with_browser_detection(cfg.detect_browser_cookies && args.browser_cookies);
    match HistoryDb::open_default().await {
        Ok(history) => orchestrator = orchestrator.with_history(history),
        Err(e) => tracing::warn!("batch history unavailable: {:#}", e),
    }

    let registry = Arc::new(JobRegistry::new(Arc::new(orchestrator)));
    let output_dir = args.output_dir.to_string_lossy();
    let job_id = registry
        .submit_batch(&args.urls, &args.format, &output_dir)
        .await?;
    if !args.json {
        println!("Batch {job_id}: {} item(s)", args.urls.len());
    }

    // Ctrl-C stops the batch before its next attempt.
    let interrupt = {
        let registry = Arc::clone(&registry);
        let job_id = job_id.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("Cancelling batch...");
                registry.cancel(&job_id);
            }
        })
    };

    if !args.json {
        let mut last_line = String::new();
        loop {
            let Some(state) = registry.get_state(&job_id) else {
                break;
            };
            let line = progress_line(&state);
            if line != last_line {
                println!("{line}");
                last_line = line;
            }
            if state.phase.is_terminal() {
                break;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    let state = registry
        .wait(&job_id)
        .await
        .context("batch disappeared before it finished")?;
    interrupt.abort();
    registry.evict(&job_id);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else {
        print_summary(&state);
    }

    if !state.failed_items.is_empty() {
        bail!(
            "{} of {} item(s) failed",
            state.failed_items.len(),
            state.total_items
        );
    }
    if state.phase != JobPhase::Complete {
        bail!("batch did not complete: {}", state.status_message);
    }
    Ok(())
}

fn progress_line(state: &ProgressState) -> String {
    let mut line = format!(
        "[{:>5.1}%] {} ({}/{})",
        state.overall_progress,
        state.phase.as_str(),
        state.current_index,
        state.total_items
    );
    if !state.current_item_message.is_empty() {
        line.push_str(" - ");
        line.push_str(&state.current_item_message);
    }
    line
}

fn print_summary(state: &ProgressState) {
    let ok = state.total_items.saturating_sub(state.failed_items.len());
    println!(
        "{}: {ok}/{} downloaded ({})",
        state.job_id, state.total_items, state.status_message
    );
    for url in &state.failed_items {
        println!("  failed: {url}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_line_shows_one_based_item_and_message() {
        // `current_index` is 1-based once an item has started.
        let mut state = ProgressState::new("job", 3);
        state.current_index = 1;
        let line = progress_line(&state);
        assert!(line.contains("(1/3)"), "{line}");

        state.current_index = 2;
        state.overall_progress = 33.3;
        state.current_item_message = "Attempt 1/10: Default".to_string();
        let line = progress_line(&state);
        assert!(line.starts_with("[ 33.3%]"));
        assert!(line.contains("(2/3)"), "{line}");
        assert!(line.ends_with("Attempt 1/10: Default"));
    }
}
