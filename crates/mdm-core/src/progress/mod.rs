//! Progress reporting for batch jobs.
//!
//! One `ProgressState` exists per batch. The batch task is its only writer;
//! any number of pollers read it through `ProgressHandle::snapshot`, which
//! clones the whole record under a read lock so multi-field reads are never
//! torn.

mod state;

pub use state::{JobPhase, ProgressState};

use std::sync::{Arc, PoisonError, RwLock};

/// Shared handle to one batch's progress record.
#[derive(Debug, Clone)]
pub struct ProgressHandle {
    inner: Arc<RwLock<ProgressState>>,
}

impl ProgressHandle {
    /// New record in phase `queued`.
    pub fn new(job_id: impl Into<String>, total_items: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ProgressState::new(job_id, total_items))),
        }
    }

    /// Consistent copy of the current state.
    pub fn snapshot(&self) -> ProgressState {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn job_id(&self) -> String {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .job_id
            .clone()
    }

    /// Apply a mutation under the write lock.
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut ProgressState) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub(crate) fn start(&self) {
        self.update(ProgressState::start);
    }

    pub(crate) fn begin_item(&self, index: usize) {
        self.update(|s| s.begin_item(index));
    }

    pub(crate) fn set_item_progress(&self, percent: f64) {
        self.update(|s| s.set_item_progress(percent));
    }

    pub(crate) fn set_item_message(&self, message: impl Into<String>) {
        let message = message.into();
        self.update(|s| s.current_item_message = message);
    }

    pub(crate) fn complete_item(&self, index: usize) {
        self.update(|s| s.complete_item(index));
    }

    pub(crate) fn record_failure(&self, url: &str) {
        self.update(|s| s.record_failure(url));
    }

    pub(crate) fn finish(&self) {
        self.update(ProgressState::finish);
    }

    pub(crate) fn abandon(&self, reason: &str) {
        self.update(|s| s.abandon(reason));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_is_a_detached_copy() {
        let handle = ProgressHandle::new("job-1", 2);
        let before = handle.snapshot();
        handle.start();
        handle.begin_item(0);
        handle.set_item_progress(40.0);
        assert_eq!(before.phase, JobPhase::Queued);
        let now = handle.snapshot();
        assert_eq!(now.phase, JobPhase::Running);
        assert_eq!(now.current_item_progress, 40.0);
        assert_eq!(handle.job_id(), "job-1");
    }

    #[test]
    fn concurrent_readers_see_consistent_records() {
        let handle = ProgressHandle::new("job-2", 100);
        handle.start();
        let reader = {
            let handle = handle.clone();
            std::thread::spawn(move || {
                for _ in 0..1000 {
                    let s = handle.snapshot();
                    assert!(s.current_index <= s.total_items);
                    assert!(s.overall_progress <= 100.0);
                }
            })
        };
        for i in 0..100 {
            handle.begin_item(i);
            handle.complete_item(i);
        }
        handle.finish();
        reader.join().unwrap();
        assert_eq!(handle.snapshot().overall_progress, 100.0);
    }
}
