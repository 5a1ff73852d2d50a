//! Terminal presenter: progress to stderr, results to stdout.

use grabflow_core::format::FormatDescriptor;
use grabflow_core::job::JobKind;
use grabflow_core::workflow::{Presenter, WorkflowStage};
use grabflow_core::WorkflowError;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Default)]
pub struct TerminalPresenter {
    last_error: Option<WorkflowError>,
    progress_open: bool,
}

impl TerminalPresenter {
    /// Most recent failure or rejection, cleared on read.
    pub fn take_error(&mut self) -> Option<WorkflowError> {
        self.last_error.take()
    }

    fn end_progress_line(&mut self) {
        if self.progress_open {
            eprintln!();
            self.progress_open = false;
        }
    }
}

impl Presenter for TerminalPresenter {
    fn stage_changed(&mut self, from: WorkflowStage, to: WorkflowStage) {
        tracing::debug!(%from, %to, "stage");
    }

    fn formats_ready(&mut self, title: &str, descriptors: &[FormatDescriptor]) {
        self.end_progress_line();
        eprintln!("{title}: {} formats", descriptors.len());
    }

    fn progress(&mut self, job: JobKind, percent: u8) {
        eprint!("\r{:<12} {:>3}%", job.as_str(), percent);
        let _ = std::io::stderr().flush();
        self.progress_open = true;
        if percent >= 100 {
            self.end_progress_line();
        }
    }

    fn artifact_ready(&mut self, job: JobKind, path: &Path) {
        self.end_progress_line();
        println!("{}: {}", job, path.display());
    }

    fn job_failed(&mut self, _job: JobKind, error: &WorkflowError) {
        self.end_progress_line();
        self.last_error = Some(error.clone());
    }

    fn job_cancelled(&mut self, _job: JobKind) {
        self.end_progress_line();
        self.last_error = Some(WorkflowError::Cancelled);
    }

    fn rejected(&mut self, error: &WorkflowError) {
        self.last_error = Some(error.clone());
    }
}
