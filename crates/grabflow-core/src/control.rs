//! Cooperative cancellation: a shared abort token per dispatched job.
//!
//! The workflow controller hands each job a `CancelToken`. Cancelling flips the
//! token once; the job observes it at its next progress checkpoint, and
//! process-backed collaborators observe it at their next poll and kill the child.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Error returned by a collaborator that stopped because its token was cancelled.
#[derive(Debug)]
pub struct JobAborted;

impl std::fmt::Display for JobAborted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "job aborted by user")
    }
}

impl std::error::Error for JobAborted {}

/// Shared abort flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Returns `true` only for the call that actually set the flag.
    pub fn cancel(&self) -> bool {
        self.flag
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// `Err(JobAborted)` once cancellation has been requested.
    pub fn check(&self) -> Result<(), JobAborted> {
        if self.is_cancelled() {
            Err(JobAborted)
        } else {
            Ok(())
        }
    }
}
