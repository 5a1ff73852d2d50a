//! Background jobs: discovery, acquisition, conversion.
//!
//! A job body runs on its own worker thread and talks to the controller only
//! through [`JobEvent`]s: zero or more `Progress`, then exactly one terminal
//! event. The controller owns the [`JobHandle`]; the body owns nothing the
//! controller reads.

mod acquisition;
mod context;
mod conversion;
mod discovery;
pub mod runner;

use std::path::PathBuf;

use crate::control::JobAborted;
use crate::error::WorkflowError;
use crate::format::FormatDescriptor;

pub use acquisition::AcquisitionJob;
pub use context::JobContext;
pub use conversion::{ConversionJob, THUMBNAIL_SOURCE_EXTENSIONS};
pub use discovery::{DiscoveryJob, FALLBACK_TITLE};
pub use runner::{spawn, JobHandle};

pub type JobId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    Discovery,
    Acquisition,
    Conversion,
}

impl JobKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JobKind::Discovery => "discovery",
            JobKind::Acquisition => "acquisition",
            JobKind::Conversion => "conversion",
        }
    }

    /// The failure variant this kind of job reports.
    pub fn failure(self, msg: impl Into<String>) -> WorkflowError {
        let msg = msg.into();
        match self {
            JobKind::Discovery => WorkflowError::Discovery(msg),
            JobKind::Acquisition => WorkflowError::Acquisition(msg),
            JobKind::Conversion => WorkflowError::Conversion(msg),
        }
    }

    /// Maps a collaborator error; an abort marker anywhere in the chain means Cancelled.
    pub fn failure_from(self, err: anyhow::Error) -> WorkflowError {
        if err.downcast_ref::<JobAborted>().is_some() {
            WorkflowError::Cancelled
        } else {
            self.failure(format!("{err:#}"))
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JobState {
    #[default]
    Idle,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Failed | JobState::Cancelled
        )
    }
}

/// Typed result of a successful job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutput {
    Discovered {
        title: String,
        descriptors: Vec<FormatDescriptor>,
    },
    /// Final media path, or the bare stem path for side-artifact-only runs.
    Acquired { path: PathBuf },
    /// Files written by the conversion, in the order they were produced.
    Converted { artifacts: Vec<PathBuf> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEventKind {
    Progress(u8),
    Succeeded(JobOutput),
    Failed(WorkflowError),
    Cancelled,
}

impl JobEventKind {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobEventKind::Progress(_))
    }

    /// Terminal state this event moves its job into, if any.
    pub fn terminal_state(&self) -> Option<JobState> {
        match self {
            JobEventKind::Progress(_) => None,
            JobEventKind::Succeeded(_) => Some(JobState::Succeeded),
            JobEventKind::Failed(_) => Some(JobState::Failed),
            JobEventKind::Cancelled => Some(JobState::Cancelled),
        }
    }
}

/// Message from a worker to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobEvent {
    pub job_id: JobId,
    pub kind: JobKind,
    pub payload: JobEventKind,
}

/// A unit of background work. Bodies report progress through the context and
/// return their output; the runner turns the return value into the terminal event.
pub trait Job: Send + 'static {
    fn kind(&self) -> JobKind;

    fn run(self: Box<Self>, ctx: &mut JobContext) -> Result<JobOutput, WorkflowError>;
}
