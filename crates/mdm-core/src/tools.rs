//! External tool presence checks and bounded blocking invocations.

use std::io::{self, Read};
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::url_model::{normalize_url, validate_source_url};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Ceiling for a `--list-formats` query.
pub const FORMAT_LIST_TIMEOUT: Duration = Duration::from_secs(60);

/// Why the format table of a URL could not be fetched.
#[derive(Debug, Error)]
pub enum FormatListError {
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("cannot launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("timed out after {0} s while listing formats")]
    TimedOut(u64),

    #[error("error checking formats: {0}")]
    Failed(String),
}

/// Availability of the external tools the engine drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ToolStatus {
    pub downloader: bool,
    pub merge_tool: bool,
}

/// Runs `cmd` to completion, killing it if it outlives `timeout`.
///
/// Returns `Ok(None)` on timeout. Blocking; use from `spawn_blocking` in
/// async code.
/// Both pipes are drained on their own threads while waiting, so a chatty
/// child cannot block on a full pipe.
pub fn run_with_timeout(cmd: &mut Command, timeout: Duration) -> io::Result<Option<Output>> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);
    let deadline = Instant::now() + timeout;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            // Readers end once every holder of the pipes exits; not joined.
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    };
    Ok(Some(Output {
        status,
        stdout: collect(stdout),
        stderr: collect(stderr),
    }))
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Err(e) = pipe.read_to_end(&mut buf) {
            tracing::debug!("tool pipe read error: {}", e);
        }
        buf
    })
}

fn collect(reader: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    reader.and_then(|h| h.join().ok()).unwrap_or_default()
}

/// True if `program <flag>` exits successfully within `timeout`.
pub fn version_check(program: &Path, flag: &str, timeout: Duration) -> bool {
    match run_with_timeout(Command::new(program).arg(flag), timeout) {
        Ok(Some(output)) => output.status.success(),
        Ok(None) => {
            tracing::debug!(program = %program.display(), "version check timed out");
            false
        }
        Err(e) => {
            tracing::debug!(program = %program.display(), "version check failed: {}", e);
            false
        }
    }
}

/// Checks both external tools. Blocking.
pub fn check_tools(downloader: &Path, merge_tool: &Path) -> ToolStatus {
    let timeout = Duration::from_secs(10);
    ToolStatus {
        downloader: version_check(downloader, "--version", timeout),
        merge_tool: version_check(merge_tool, "-version", timeout),
    }
}

/// The tool's table of available formats for `url`, as printed. Blocking.
pub fn list_formats(
    downloader: &Path,
    url: &str,
    timeout: Duration,
) -> Result<String, FormatListError> {
    validate_source_url(url).map_err(|reason| FormatListError::InvalidUrl {
        url: url.to_string(),
        reason,
    })?;
    let url = normalize_url(url);
    let mut cmd = Command::new(downloader);
    cmd.args(["--list-formats", "--no-playlist"]).arg(&url);
    let output = run_with_timeout(&mut cmd, timeout)
        .map_err(|source| FormatListError::Launch {
            program: downloader.display().to_string(),
            source,
        })?
        .ok_or(FormatListError::TimedOut(timeout.as_secs()))?;
    if output.status.success() {
        return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let message = stderr
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("unknown error")
        .trim()
        .to_string();
    Err(FormatListError::Failed(message))
}
