//! Job control for cancellation: shared abort tokens keyed by batch job id.
//!
//! Each running batch is registered with an abort token. A caller that wants
//! to abandon a batch requests abort; the orchestrator checks the token
//! between URLs and the runner checks it between attempts.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// True once abort was requested on the token (a missing token never aborts).
pub fn is_aborted(token: Option<&AtomicBool>) -> bool {
    token.is_some_and(|t| t.load(Ordering::Relaxed))
}

/// Shared registry of job id -> abort token.
#[derive(Default)]
pub struct JobControl {
    jobs: RwLock<HashMap<String, Arc<AtomicBool>>>,
}

impl JobControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job; returns the abort token to pass to the batch task.
    pub fn register(&self, job_id: &str) -> Arc<AtomicBool> {
        let token = Arc::new(AtomicBool::new(false));
        self.jobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(job_id.to_string(), Arc::clone(&token));
        token
    }

    /// Unregister a job (call when the batch finishes, success or failure).
    pub fn unregister(&self, job_id: &str) {
        self.jobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(job_id);
    }

    /// Request abort for a job. Returns false if the job is not registered.
    pub fn request_abort(&self, job_id: &str) -> bool {
        match self
            .jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(job_id)
        {
            Some(token) => {
                token.store(true, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abort_sets_registered_token() {
        let control = JobControl::new();
        let token = control.register("job-a");
        assert!(!is_aborted(Some(&token)));
        assert!(control.request_abort("job-a"));
        assert!(is_aborted(Some(&token)));
    }

    #[test]
    fn abort_unknown_job_is_noop() {
        let control = JobControl::new();
        let token = control.register("job-a");
        control.unregister("job-a");
        assert!(!control.request_abort("job-a"));
        assert!(!control.request_abort("job-b"));
        assert!(!is_aborted(Some(&token)));
        assert!(!is_aborted(None));
    }
}
