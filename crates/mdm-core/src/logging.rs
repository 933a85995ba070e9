//! Logging init: append-only file under the XDG state dir, or stderr.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Filter for the log file when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "info,mdm=debug,mdm_core=debug,mdm_cli=debug";

/// Filter for the stderr fallback; stdout carries batch progress, so keep it quiet.
const STDERR_FILTER: &str = "warn,mdm_core=info";

const LOG_FILE_NAME: &str = "mdm.log";

/// State directory shared by the log file, journal and history DB.
pub fn state_dir() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("mdm")?;
    Ok(xdg_dirs.get_state_home().join("mdm"))
}

/// Where `init_logging` writes, `~/.local/state/mdm/mdm.log` by default.
pub fn log_file_path() -> Result<PathBuf> {
    Ok(state_dir()?.join(LOG_FILE_NAME))
}

fn env_filter_or(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the global subscriber writing to the log file.
///
/// Errors when the state dir or file cannot be created, or a subscriber is
/// already installed; callers fall back to [`init_logging_stderr`].
pub fn init_logging() -> Result<()> {
    let path = log_file_path()?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter_or(DEFAULT_FILTER))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("install log subscriber: {}", e))?;

    tracing::info!("mdm logging initialized at {}", path.display());
    Ok(())
}

/// Stderr-only logging. Never fails; a second install is ignored.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter_or(STDERR_FILTER))
        .with_writer(std::io::stderr)
        .try_init();
}
