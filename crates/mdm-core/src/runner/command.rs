//! Command line of one tool invocation.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use crate::auth::AuthStrategy;
use crate::format::{FormatPolicy, MediaFormat};

/// Output name template relative to the output directory.
pub const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Fully resolved invocation: program, arguments, working directory.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl ToolCommand {
    /// Builds the invocation for one attempt. The URL always goes last.
    pub fn build(
        program: &Path,
        cache_dir: &Path,
        url: &str,
        format: &MediaFormat,
        policy: FormatPolicy,
        output_dir: &Path,
        strategy: &AuthStrategy,
    ) -> Self {
        let mut args = vec!["-f".to_string(), policy.selector(format).to_string()];
        args.extend(policy.format_args(format));
        args.extend([
            "-o".to_string(),
            output_dir.join(OUTPUT_TEMPLATE).to_string_lossy().into_owned(),
            "--no-playlist".to_string(),
            "--newline".to_string(),
            "--cache-dir".to_string(),
            cache_dir.to_string_lossy().into_owned(),
        ]);
        args.extend(strategy.args().map(str::to_string));
        args.push(url.to_string());
        Self {
            program: program.to_path_buf(),
            args,
            cwd: output_dir.to_path_buf(),
        }
    }

    /// Process builder with piped output; the child dies with the handle.
    pub fn to_command(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Selector passed with `-f`.
    pub fn selector(&self) -> Option<&str> {
        self.args
            .windows(2)
            .find(|w| w[0] == "-f")
            .map(|w| w[1].as_str())
    }
}
