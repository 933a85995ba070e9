//! CLI for the MDM batch media downloader.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mdm_core::config;
use std::path::PathBuf;

use commands::{
    run_download, run_failed, run_formats, run_remove, run_status, run_tools, DownloadArgs,
};

/// Top-level CLI for the MDM batch media downloader.
#[derive(Debug, Parser)]
#[command(name = "mdm")]
#[command(about = "MDM: batch media downloader with adaptive retry strategies", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download a batch of URLs, one after another.
    Download {
        /// Source page URLs.
        #[arg(required = true, num_args = 1..)]
        urls: Vec<String>,

        /// Output format: mp4, mkv, webm (video) or mp3, m4a, flac, opus, wav (audio).
        #[arg(short, long, default_value = "mp4")]
        format: String,

        /// Directory for finished files (created if missing; `Downloads` is the user download folder).
        #[arg(short, long, default_value = ".", value_name = "DIR")]
        output_dir: PathBuf,

        /// Bot-bypass (PO) token added to every attempt.
        #[arg(long, value_name = "TOKEN")]
        po_token: Option<String>,

        /// Skip probing installed browsers for session cookies.
        #[arg(long)]
        no_browser_cookies: bool,

        /// Print the final batch state as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show recent batches.
    Status {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show permanently failed downloads from the journal.
    Failed {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Remove a batch from the history by its job id.
    Remove {
        /// Batch job identifier.
        job_id: String,
    },

    /// List the formats the media tool can fetch for one URL.
    Formats {
        /// Source page URL.
        url: String,
    },

    /// Check that the media tool and the merge tool are installed.
    Tools,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Download {
                urls,
                format,
                output_dir,
                po_token,
                no_browser_cookies,
                json,
            } => {
                let args = DownloadArgs {
                    urls,
                    format,
                    output_dir,
                    po_token,
                    browser_cookies: !no_browser_cookies,
                    json,
                };
                run_download(&cfg, args).await?
            }
            CliCommand::Status { json } => run_status(json).await?,
            CliCommand::Failed { json } => run_failed(&cfg, json)?,
            CliCommand::Remove { job_id } => run_remove(&job_id).await?,
            CliCommand::Formats { url } => run_formats(&cfg, &url).await?,
            CliCommand::Tools => run_tools(&cfg).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
