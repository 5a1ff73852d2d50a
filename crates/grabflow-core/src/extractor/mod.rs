//! Extractor/downloader collaborator: lists formats and acquires media.

pub mod ytdlp;

use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::control::{CancelToken, JobAborted};
use crate::format::RawFormat;
use crate::options::AcquisitionPlan;

pub use ytdlp::YtDlp;

/// What a simulate-only listing returns.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListedFormats {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub formats: Vec<RawFormat>,
}

/// One periodic transfer report from the collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferProgress {
    pub downloaded_bytes: u64,
    pub total_bytes: Option<u64>,
    pub total_bytes_estimate: Option<u64>,
}

impl TransferProgress {
    /// Integer percentage 0..=100, using the exact total if known, else the estimate.
    pub fn percent(&self) -> Option<u8> {
        let total = self
            .total_bytes
            .filter(|t| *t > 0)
            .or(self.total_bytes_estimate.filter(|t| *t > 0))?;
        let pct = self.downloaded_bytes.saturating_mul(100) / total;
        Some(pct.min(100) as u8)
    }
}

/// Everything the collaborator needs to acquire one pass's artifacts.
#[derive(Debug, Clone)]
pub struct AcquireRequest {
    pub url: String,
    pub plan: AcquisitionPlan,
    pub output_dir: PathBuf,
}

impl AcquireRequest {
    /// `<output_dir>/<stem>`, without extension.
    pub fn stem_path(&self) -> PathBuf {
        self.output_dir.join(&self.plan.stem)
    }

    /// Output template handed to the collaborator; it picks the extension.
    pub fn output_template(&self) -> PathBuf {
        self.output_dir.join(format!("{}.%(ext)s", self.plan.stem))
    }
}

/// Progress sink passed into [`Extractor::acquire`]. Returning `JobAborted`
/// tells the collaborator to stop.
pub type ProgressSink<'a> = dyn FnMut(TransferProgress) -> std::result::Result<(), JobAborted> + 'a;

pub trait Extractor: Send + Sync {
    fn name(&self) -> &str;

    /// Lists formats and the title without fetching media.
    ///
    /// Must return an error wrapping `JobAborted` promptly once `cancel` fires.
    fn list_formats(&self, url: &str, cancel: &CancelToken) -> Result<ListedFormats>;

    /// Fetches the planned artifacts and returns the final media path.
    ///
    /// Must return an error wrapping `JobAborted` promptly once `cancel` fires.
    fn acquire(
        &self,
        request: &AcquireRequest,
        progress: &mut ProgressSink<'_>,
        cancel: &CancelToken,
    ) -> Result<PathBuf>;
}

/// First existing `<dir>/<stem>.<ext>` for the candidate extensions, in order.
pub fn find_artifact(dir: &Path, stem: &str, extensions: &[&str]) -> Option<PathBuf> {
    extensions
        .iter()
        .map(|ext| dir.join(format!("{stem}.{ext}")))
        .find(|p| p.is_file())
}
