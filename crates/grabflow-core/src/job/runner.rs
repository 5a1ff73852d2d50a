//! Worker threads: one per dispatched job.

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use super::{Job, JobContext, JobEvent, JobEventKind, JobId, JobKind, JobOutput, JobState};
use crate::control::CancelToken;
use crate::error::WorkflowError;

/// Controller-side handle of a dispatched job.
#[derive(Debug)]
pub struct JobHandle {
    id: JobId,
    kind: JobKind,
    cancel: CancelToken,
    state: JobState,
    worker: Option<JoinHandle<()>>,
}

impl JobHandle {
    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == JobState::Running
    }

    /// Requests cancellation. Only a Running job can be cancelled, and only once.
    pub fn cancel(&self) -> bool {
        self.is_running() && self.cancel.cancel()
    }

    pub fn cancel_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn mark_terminal(&mut self, state: JobState) {
        debug_assert!(state.is_terminal());
        self.state = state;
    }

    /// Blocks until the worker thread has exited.
    pub fn join(mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Terminal event for a finished body. A cancelled token wins over any result.
fn terminal_payload(
    kind: JobKind,
    outcome: std::thread::Result<Result<JobOutput, WorkflowError>>,
    cancelled: bool,
) -> JobEventKind {
    if cancelled {
        return JobEventKind::Cancelled;
    }
    match outcome {
        Ok(Ok(output)) => JobEventKind::Succeeded(output),
        Ok(Err(WorkflowError::Cancelled)) => JobEventKind::Cancelled,
        Ok(Err(err)) => JobEventKind::Failed(err),
        Err(payload) => JobEventKind::Failed(kind.failure(format!(
            "{} job panicked: {}",
            kind,
            panic_message(payload.as_ref())
        ))),
    }
}

/// Starts `job` on a new worker thread. Events go to `tx`, tagged with `id`.
pub fn spawn(id: JobId, job: Box<dyn Job>, tx: Sender<JobEvent>) -> io::Result<JobHandle> {
    let kind = job.kind();
    let cancel = CancelToken::new();
    let worker_cancel = cancel.clone();

    let worker = thread::Builder::new()
        .name(format!("grabflow-{}-{}", kind, id))
        .spawn(move || {
            let mut ctx = JobContext::new(id, kind, tx, worker_cancel.clone());
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| job.run(&mut ctx)));
            let payload = terminal_payload(kind, outcome, worker_cancel.is_cancelled());
            match &payload {
                JobEventKind::Succeeded(_) => tracing::info!(job_id = id, %kind, "job succeeded"),
                JobEventKind::Failed(err) => {
                    tracing::warn!(job_id = id, %kind, "job failed: {err}")
                }
                JobEventKind::Cancelled => tracing::info!(job_id = id, %kind, "job cancelled"),
                JobEventKind::Progress(_) => {}
            }
            ctx.finish(payload);
        })?;

    tracing::info!(job_id = id, %kind, "job dispatched");
    Ok(JobHandle {
        id,
        kind,
        cancel,
        state: JobState::Running,
        worker: Some(worker),
    })
}
