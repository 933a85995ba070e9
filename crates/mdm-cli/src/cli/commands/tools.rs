//! `mdm tools` – report whether the external tools can be launched.

use anyhow::{bail, Result};
use mdm_core::config::MdmConfig;
use mdm_core::logging::log_file_path;
use mdm_core::tools::check_tools;
use std::path::PathBuf;

pub async fn run_tools(cfg: &MdmConfig) -> Result<()> {
    let downloader = PathBuf::from(&cfg.downloader_path);
    let merge_tool = PathBuf::from(&cfg.merge_tool_path);
    let status = {
        let (d, m) = (downloader.clone(), merge_tool.clone());
        tokio::task::spawn_blocking(move || check_tools(&d, &m)).await?
    };

    let mark = |ok: bool| if ok { "ok" } else { "missing" };
    println!("{:<12} {:<8} {}", "downloader", mark(status.downloader), downloader.display());
    println!("{:<12} {:<8} {}", "merge tool", mark(status.merge_tool), merge_tool.display());
    if let Ok(log) = log_file_path() {
        println!("{:<12} {:<8} {}", "log file", "", log.display());
    }
    if !status.merge_tool {
        println!("Without the merge tool only progressive (single-file) formats are used.");
    }
    if !status.downloader {
        bail!("media download tool not found: {}", downloader.display());
    }
    Ok(())
}
