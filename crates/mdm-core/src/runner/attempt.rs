//! One tool run: spawn, stream output through the parser, wait with a ceiling.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;

use super::command::ToolCommand;
use crate::parse::{AttemptSignals, OutputParser};
use crate::progress::ProgressHandle;
use crate::retry::AttemptError;

/// What the process did, before any filesystem checks.
#[derive(Debug)]
pub struct ProcessOutcome {
    /// `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub signals: AttemptSignals,
}

impl ProcessOutcome {
    pub fn exit_success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Forwards every line of `stream` into `tx`. Invalid UTF-8 is replaced.
async fn pump_lines<R>(stream: R, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\n', '\r']);
                // Progress without --newline is separated by carriage returns.
                for part in line.split('\r') {
                    if tx.send(part.to_string()).is_err() {
                        return;
                    }
                }
            }
            Err(e) => {
                tracing::debug!("tool output read error: {}", e);
                break;
            }
        }
    }
}

/// Runs `command` to completion, feeding stdout and stderr (interleaved by
/// arrival) through `parser` and publishing progress on `progress`.
///
/// The child is killed if it outlives `timeout`; that counts as a failed
/// attempt, as does a launch error.
pub async fn run_process(
    command: &ToolCommand,
    timeout: Duration,
    progress: &ProgressHandle,
) -> Result<ProcessOutcome, AttemptError> {
    let mut child = command
        .to_command()
        .spawn()
        .map_err(|source| AttemptError::Launch {
            program: command.program.display().to_string(),
            source,
        })?;

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(pump_lines(stdout, tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(pump_lines(stderr, tx.clone()));
    }
    drop(tx);

    let mut parser = OutputParser::default();
    let run = async {
        while let Some(line) = rx.recv().await {
            tracing::trace!(target: "mdm_core::tool", "{}", line);
            if let Some(p) = parser.feed(&line) {
                progress.set_item_progress(p);
            }
        }
        child.wait().await
    };

    let waited = tokio::time::timeout(timeout, run).await;
    match waited {
        Ok(status) => {
            let status = status?;
            Ok(ProcessOutcome {
                exit_code: status.code(),
                signals: parser.finish(),
            })
        }
        Err(_) => {
            if let Err(e) = child.kill().await {
                tracing::debug!("kill after timeout failed: {}", e);
            }
            tracing::warn!(
                program = %command.program.display(),
                "tool exceeded {} s, killed",
                timeout.as_secs()
            );
            Err(AttemptError::TimedOut(timeout.as_secs()))
        }
    }
}
