//! Tests for the batch history (in-memory DB helper from db).

use std::path::PathBuf;

use super::db::open_memory;
use super::{HistoryDb, NewBatch};
use crate::progress::{JobPhase, ProgressHandle};

fn batch(job_id: &str, urls: &[&str]) -> NewBatch {
    NewBatch {
        job_id: job_id.to_string(),
        format: "mp3".to_string(),
        output_dir: PathBuf::from("/music"),
        urls: urls.iter().map(|u| u.to_string()).collect(),
    }
}

#[tokio::test]
async fn started_then_finished() {
    let db = open_memory().await.unwrap();
    db.record_started(&batch("job-a", &["https://a.test/1", "https://a.test/2"]))
        .await
        .unwrap();

    let rows = db.list_batches().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].phase, JobPhase::Running);
    assert_eq!(rows[0].total_items, 2);
    assert!(rows[0].finished_at.is_none());

    let progress = ProgressHandle::new("job-a", 2);
    progress.start();
    progress.begin_item(0);
    progress.record_failure("https://a.test/1");
    progress.begin_item(1);
    progress.complete_item(1);
    progress.finish();
    db.record_finished(&progress.snapshot()).await.unwrap();

    let rows = db.list_batches().await.unwrap();
    assert_eq!(rows[0].phase, JobPhase::Complete);
    assert_eq!(rows[0].failed_items, vec!["https://a.test/1".to_string()]);
    assert_eq!(rows[0].urls.len(), 2);
    assert_eq!(rows[0].output_dir, "/music");
    assert!(rows[0].finished_at.is_some());
}

#[tokio::test]
async fn list_and_remove() {
    let db = open_memory().await.unwrap();
    db.record_started(&batch("one", &["https://a.test/1"])).await.unwrap();
    db.record_started(&batch("two", &["https://a.test/2"])).await.unwrap();
    let ids: Vec<String> = db
        .list_batches()
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.job_id)
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&"one".to_string()));

    assert!(db.remove_batch("one").await.unwrap());
    assert!(!db.remove_batch("one").await.unwrap());
    assert_eq!(db.list_batches().await.unwrap().len(), 1);
}

#[tokio::test]
async fn open_at_creates_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested dir").join("history.db");
    let db = HistoryDb::open_at(&path).await.unwrap();
    db.record_started(&batch("x", &["https://a.test/x"])).await.unwrap();
    drop(db);
    let reopened = HistoryDb::open_at(&path).await.unwrap();
    assert_eq!(reopened.list_batches().await.unwrap().len(), 1);
}
