//! `mdm status` – list batches recorded in the history database.

use anyhow::Result;
use mdm_core::history::HistoryDb;

pub async fn run_status(json: bool) -> Result<()> {
    let db = HistoryDb::open_default().await?;
    let batches = db.list_batches().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&batches)?);
        return Ok(());
    }
    if batches.is_empty() {
        println!("No batches in history.");
        return Ok(());
    }
    println!(
        "{:<36} {:<10} {:<6} {:<8} {}",
        "JOB", "PHASE", "FORMAT", "FAILED", "OUTPUT"
    );
    for b in batches {
        println!(
            "{:<36} {:<10} {:<6} {:<8} {}",
            b.job_id,
            b.phase.as_str(),
            b.format,
            format!("{}/{}", b.failed_items.len(), b.total_items),
            b.output_dir
        );
    }
    Ok(())
}
