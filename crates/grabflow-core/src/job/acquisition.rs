use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use super::{Job, JobContext, JobKind, JobOutput};
use crate::control::JobAborted;
use crate::error::WorkflowError;
use crate::extractor::{AcquireRequest, Extractor, TransferProgress};
use crate::options::{AcquisitionPlan, WorkflowOptions};

/// Downloads the planned media and/or side artifacts.
pub struct AcquisitionJob {
    request: AcquireRequest,
    extractor: Arc<dyn Extractor>,
}

impl AcquisitionJob {
    /// Builds the job from a snapshot of the options. Fails for target None or
    /// a merged target without a selected format.
    pub fn new(
        url: impl Into<String>,
        options: &WorkflowOptions,
        output_dir: impl Into<PathBuf>,
        extractor: Arc<dyn Extractor>,
    ) -> Result<Self, WorkflowError> {
        let plan = AcquisitionPlan::from_options(options)?;
        Ok(Self {
            request: AcquireRequest {
                url: url.into(),
                plan,
                output_dir: output_dir.into(),
            },
            extractor,
        })
    }

    pub fn request(&self) -> &AcquireRequest {
        &self.request
    }
}

impl Job for AcquisitionJob {
    fn kind(&self) -> JobKind {
        JobKind::Acquisition
    }

    fn run(self: Box<Self>, ctx: &mut JobContext) -> Result<JobOutput, WorkflowError> {
        let request = &self.request;
        fs::create_dir_all(&request.output_dir).map_err(|e| {
            JobKind::Acquisition.failure(format!(
                "create output dir {}: {e}",
                request.output_dir.display()
            ))
        })?;
        ctx.report(0)?;

        tracing::info!(
            target_kind = request.plan.target.as_str(),
            selection = request.plan.selection.as_str(),
            stem = %request.plan.stem,
            "starting acquisition"
        );

        let cancel = ctx.cancel_token().clone();
        let result = {
            let mut on_progress = |p: TransferProgress| -> Result<(), JobAborted> {
                match p.percent() {
                    Some(pct) => ctx.report(pct).map_err(|_| JobAborted),
                    None => cancel.check(),
                }
            };
            self.extractor.acquire(request, &mut on_progress, &cancel)
        };
        let path = result.map_err(|e| JobKind::Acquisition.failure_from(e))?;
        ctx.checkpoint()?;

        // Side-artifact runs report the bare stem; the collaborator picks extensions.
        let path = if request.plan.selection.downloads_media() {
            path
        } else {
            request.stem_path()
        };
        ctx.report(100)?;
        tracing::info!(path = %path.display(), "acquisition finished");
        Ok(JobOutput::Acquired { path })
    }
}
