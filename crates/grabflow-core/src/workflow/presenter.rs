//! Presentation collaborator: where the controller surfaces outcomes.
//!
//! All methods are called on the controller's thread. Every method has a
//! no-op default so front ends implement only what they show.

use std::path::Path;

use super::WorkflowStage;
use crate::error::WorkflowError;
use crate::format::FormatDescriptor;
use crate::job::JobKind;

pub trait Presenter {
    fn stage_changed(&mut self, _from: WorkflowStage, _to: WorkflowStage) {}

    fn formats_ready(&mut self, _title: &str, _descriptors: &[FormatDescriptor]) {}

    fn progress(&mut self, _job: JobKind, _percent: u8) {}

    /// A job produced a file (or, for side-artifact runs, a stem path).
    fn artifact_ready(&mut self, _job: JobKind, _path: &Path) {}

    fn job_failed(&mut self, _job: JobKind, _error: &WorkflowError) {}

    fn job_cancelled(&mut self, _job: JobKind) {}

    /// A user request was refused (bad input or unmet precondition).
    fn rejected(&mut self, _error: &WorkflowError) {}
}

/// Presenter that shows nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {}
