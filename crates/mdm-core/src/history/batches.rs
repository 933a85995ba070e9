//! Batch row writes and reads.

use anyhow::Result;
use sqlx::Row;

use super::db::{unix_timestamp, HistoryDb};
use super::types::{BatchRecord, NewBatch};
use crate::progress::{JobPhase, ProgressState};

impl HistoryDb {
    /// Insert a batch in phase `running`.
    pub async fn record_started(&self, batch: &NewBatch) -> Result<()> {
        let urls_json = serde_json::to_string(&batch.urls)?;
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO batches (
                job_id, format, output_dir, total_items, urls_json,
                failed_json, phase, message, created_at, finished_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, '[]', ?6, '', ?7, NULL)
            "#,
        )
        .bind(&batch.job_id)
        .bind(&batch.format)
        .bind(batch.output_dir.to_string_lossy().into_owned())
        .bind(batch.urls.len() as i64)
        .bind(urls_json)
        .bind(JobPhase::Running.as_str())
        .bind(unix_timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Store the final state of a batch.
    pub async fn record_finished(&self, state: &ProgressState) -> Result<()> {
        let failed_json = serde_json::to_string(&state.failed_items)?;
        sqlx::query(
            r#"
            UPDATE batches
            SET failed_json = ?1,
                phase = ?2,
                message = ?3,
                finished_at = ?4
            WHERE job_id = ?5
            "#,
        )
        .bind(failed_json)
        .bind(state.phase.as_str())
        .bind(&state.status_message)
        .bind(unix_timestamp())
        .bind(&state.job_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// All batches, newest first.
    pub async fn list_batches(&self) -> Result<Vec<BatchRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT job_id, format, output_dir, total_items, urls_json,
                   failed_json, phase, message, created_at, finished_at
            FROM batches
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let urls_json: String = row.get("urls_json");
            let failed_json: String = row.get("failed_json");
            let phase: String = row.get("phase");
            out.push(BatchRecord {
                job_id: row.get("job_id"),
                format: row.get("format"),
                output_dir: row.get("output_dir"),
                total_items: row.get("total_items"),
                urls: serde_json::from_str(&urls_json).unwrap_or_default(),
                failed_items: serde_json::from_str(&failed_json).unwrap_or_default(),
                phase: JobPhase::from_str(&phase),
                message: row.get("message"),
                created_at: row.get("created_at"),
                finished_at: row.get("finished_at"),
            });
        }
        Ok(out)
    }

    /// Delete one batch row. Returns false if it did not exist.
    pub async fn remove_batch(&self, job_id: &str) -> Result<bool> {
        let affected = sqlx::query("DELETE FROM batches WHERE job_id = ?1")
            .bind(job_id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }
}
