//! Presenter that records every notification in order.

use std::path::{Path, PathBuf};

use grabflow_core::format::FormatDescriptor;
use grabflow_core::job::JobKind;
use grabflow_core::workflow::{Presenter, WorkflowStage};
use grabflow_core::WorkflowError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Stage(WorkflowStage, WorkflowStage),
    Formats(String, usize),
    Progress(JobKind, u8),
    Artifact(JobKind, PathBuf),
    Failed(JobKind, WorkflowError),
    Cancelled(JobKind),
    Rejected(WorkflowError),
}

#[derive(Debug, Default)]
pub struct RecordingPresenter {
    pub notices: Vec<Notice>,
}

impl RecordingPresenter {
    pub fn progress_of(&self, job: JobKind) -> Vec<u8> {
        self.notices
            .iter()
            .filter_map(|n| match n {
                Notice::Progress(k, p) if *k == job => Some(*p),
                _ => None,
            })
            .collect()
    }

    pub fn failures(&self) -> Vec<(JobKind, WorkflowError)> {
        self.notices
            .iter()
            .filter_map(|n| match n {
                Notice::Failed(k, e) => Some((*k, e.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn rejections(&self) -> Vec<WorkflowError> {
        self.notices
            .iter()
            .filter_map(|n| match n {
                Notice::Rejected(e) => Some(e.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Presenter for RecordingPresenter {
    fn stage_changed(&mut self, from: WorkflowStage, to: WorkflowStage) {
        self.notices.push(Notice::Stage(from, to));
    }

    fn formats_ready(&mut self, title: &str, descriptors: &[FormatDescriptor]) {
        self.notices
            .push(Notice::Formats(title.to_string(), descriptors.len()));
    }

    fn progress(&mut self, job: JobKind, percent: u8) {
        self.notices.push(Notice::Progress(job, percent));
    }

    fn artifact_ready(&mut self, job: JobKind, path: &Path) {
        self.notices.push(Notice::Artifact(job, path.to_path_buf()));
    }

    fn job_failed(&mut self, job: JobKind, error: &WorkflowError) {
        self.notices.push(Notice::Failed(job, error.clone()));
    }

    fn job_cancelled(&mut self, job: JobKind) {
        self.notices.push(Notice::Cancelled(job));
    }

    fn rejected(&mut self, error: &WorkflowError) {
        self.notices.push(Notice::Rejected(error.clone()));
    }
}
