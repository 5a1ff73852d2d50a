use std::sync::Arc;

use super::{Job, JobContext, JobKind, JobOutput};
use crate::error::WorkflowError;
use crate::extractor::Extractor;
use crate::format::describe_formats;

/// Title used when the source reports none.
pub const FALLBACK_TITLE: &str = "video";

/// Lists the formats of one URL without fetching media.
pub struct DiscoveryJob {
    url: String,
    extractor: Arc<dyn Extractor>,
    size_jitter: bool,
}

impl DiscoveryJob {
    pub fn new(url: impl Into<String>, extractor: Arc<dyn Extractor>, size_jitter: bool) -> Self {
        Self {
            url: url.into(),
            extractor,
            size_jitter,
        }
    }
}

impl Job for DiscoveryJob {
    fn kind(&self) -> JobKind {
        JobKind::Discovery
    }

    fn run(self: Box<Self>, ctx: &mut JobContext) -> Result<JobOutput, WorkflowError> {
        ctx.report(0)?;
        tracing::debug!(url = %self.url, extractor = self.extractor.name(), "listing formats");
        let listed = self
            .extractor
            .list_formats(&self.url, ctx.cancel_token())
            .map_err(|e| JobKind::Discovery.failure_from(e))?;
        ctx.checkpoint()?;

        let descriptors = describe_formats(&listed.formats, self.size_jitter);
        let title = listed
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| FALLBACK_TITLE.to_string());
        tracing::info!(
            %title,
            raw = listed.formats.len(),
            kept = descriptors.len(),
            "formats discovered"
        );

        ctx.report(100)?;
        Ok(JobOutput::Discovered { title, descriptors })
    }
}
