//! `mdm failed` – list permanently failed downloads from the CSV journal.

use anyhow::Result;
use mdm_core::config::MdmConfig;
use mdm_core::journal::{FailureJournal, TIMESTAMP_FORMAT};

pub fn run_failed(cfg: &MdmConfig, json: bool) -> Result<()> {
    let journal = FailureJournal::open_default(cfg)?;
    let failures = journal.failures()?;
    if json {
        let rows: Vec<_> = failures
            .iter()
            .map(|f| {
                serde_json::json!({
                    "url": f.url,
                    "type": f.item_type,
                    "timestamp": f.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                    "error": f.error_summary,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    if failures.is_empty() {
        println!("No failed downloads in {}", journal.path().display());
        return Ok(());
    }
    println!("{:<19} {:<6} {}", "WHEN", "TYPE", "URL");
    for f in &failures {
        println!(
            "{:<19} {:<6} {}",
            f.timestamp.format(TIMESTAMP_FORMAT),
            f.item_type,
            f.url
        );
        println!("    {}", f.error_summary);
    }
    Ok(())
}
