use std::fmt;

/// Position of the controller in the linear workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum WorkflowStage {
    #[default]
    UrlInput,
    OptionsAndDownload,
    Convert,
    Finish,
}

impl WorkflowStage {
    /// The stage `back()` moves to; `None` from the first stage.
    pub fn previous(self) -> Option<WorkflowStage> {
        match self {
            WorkflowStage::UrlInput => None,
            WorkflowStage::OptionsAndDownload => Some(WorkflowStage::UrlInput),
            WorkflowStage::Convert => Some(WorkflowStage::OptionsAndDownload),
            WorkflowStage::Finish => Some(WorkflowStage::Convert),
        }
    }

    pub fn index(self) -> usize {
        match self {
            WorkflowStage::UrlInput => 0,
            WorkflowStage::OptionsAndDownload => 1,
            WorkflowStage::Convert => 2,
            WorkflowStage::Finish => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowStage::UrlInput => "url-input",
            WorkflowStage::OptionsAndDownload => "options-and-download",
            WorkflowStage::Convert => "convert",
            WorkflowStage::Finish => "finish",
        }
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
