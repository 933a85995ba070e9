//! `mdm remove <job_id>` – drop a batch from the history database.

use anyhow::{bail, Result};
use mdm_core::history::HistoryDb;

pub async fn run_remove(job_id: &str) -> Result<()> {
    let db = HistoryDb::open_default().await?;
    if !db.remove_batch(job_id).await? {
        bail!("no batch with id {job_id}");
    }
    println!("Removed batch {job_id}");
    Ok(())
}
