use thiserror::Error;

/// Every way a workflow step can end without success.
///
/// Job bodies convert collaborator failures into one of these at the job
/// boundary; the controller surfaces them to the presenter unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// Bad or missing input, or a stage-entry precondition that does not hold.
    #[error("{0}")]
    Validation(String),

    #[error("could not list formats: {0}")]
    Discovery(String),

    #[error("download failed: {0}")]
    Acquisition(String),

    /// Conversion was requested but the file to convert is not on disk.
    #[error("source artifact not found for '{stem}' (looked for {searched})")]
    SourceArtifactNotFound { stem: String, searched: String },

    #[error("conversion failed: {0}")]
    Conversion(String),

    /// User-initiated; not a failure.
    #[error("cancelled by user")]
    Cancelled,
}

impl WorkflowError {
    pub fn validation(msg: impl Into<String>) -> Self {
        WorkflowError::Validation(msg.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, WorkflowError::Cancelled)
    }
}
