use std::sync::mpsc::Sender;

use super::{JobEvent, JobEventKind, JobId, JobKind};
use crate::control::CancelToken;
use crate::error::WorkflowError;

/// Worker-side view of a running job: its event sender and abort token.
pub struct JobContext {
    id: JobId,
    kind: JobKind,
    tx: Sender<JobEvent>,
    cancel: CancelToken,
    last_percent: Option<u8>,
}

impl JobContext {
    pub(crate) fn new(id: JobId, kind: JobKind, tx: Sender<JobEvent>, cancel: CancelToken) -> Self {
        Self {
            id,
            kind,
            tx,
            cancel,
            last_percent: None,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    /// Token to hand to collaborators.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// `Err(Cancelled)` once cancellation has been requested.
    pub fn checkpoint(&self) -> Result<(), WorkflowError> {
        self.cancel.check().map_err(|_| WorkflowError::Cancelled)
    }

    /// Emits a progress event (clamped to 100). Repeats of the last value are
    /// dropped. Doubles as a cancellation checkpoint.
    pub fn report(&mut self, percent: u8) -> Result<(), WorkflowError> {
        self.checkpoint()?;
        let percent = percent.min(100);
        if self.last_percent == Some(percent) {
            return Ok(());
        }
        self.last_percent = Some(percent);
        self.send(JobEventKind::Progress(percent));
        Ok(())
    }

    /// Consumes the context with the terminal event; nothing can be sent afterwards.
    pub(crate) fn finish(self, payload: JobEventKind) {
        self.send(payload);
    }

    fn send(&self, payload: JobEventKind) {
        let event = JobEvent {
            job_id: self.id,
            kind: self.kind,
            payload,
        };
        // The controller may already be gone (reset or shutdown).
        if self.tx.send(event).is_err() {
            tracing::debug!(job_id = self.id, kind = %self.kind, "event receiver dropped");
        }
    }
}
