//! `mdm formats <url>` – print the media tool's format table for one URL.

use anyhow::Result;
use mdm_core::config::MdmConfig;
use mdm_core::tools::{list_formats, FORMAT_LIST_TIMEOUT};
use std::path::PathBuf;

pub async fn run_formats(cfg: &MdmConfig, url: &str) -> Result<()> {
    let downloader = PathBuf::from(&cfg.downloader_path);
    let url = url.to_string();
    let table =
        tokio::task::spawn_blocking(move || list_formats(&downloader, &url, FORMAT_LIST_TIMEOUT))
            .await??;
    print!("{table}");
    Ok(())
}
