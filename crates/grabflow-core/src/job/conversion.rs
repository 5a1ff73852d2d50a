use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{Job, JobContext, JobKind, JobOutput};
use crate::codec::ImageCodec;
use crate::error::WorkflowError;
use crate::extractor::find_artifact;
use crate::options::{ImageContainer, VideoCodec, VideoContainer, WorkflowOptions};
use crate::transcode::VideoTranscoder;

/// Thumbnail extensions searched, in order, for the image to convert.
pub const THUMBNAIL_SOURCE_EXTENSIONS: &[&str] = &["webp", "jpg", "jpeg"];

const IMAGE_STARTED: u8 = 10;
const IMAGE_DONE: u8 = 50;
const VIDEO_STARTED_STEP: u8 = 5;

/// Post-acquisition conversion: thumbnail re-encode and/or video transcode.
pub struct ConversionJob {
    stem: String,
    output_dir: PathBuf,
    media_path: Option<PathBuf>,
    image_target: Option<ImageContainer>,
    video_codec: Option<VideoCodec>,
    video_container: Option<VideoContainer>,
    image_codec: Arc<dyn ImageCodec>,
    transcoder: Arc<dyn VideoTranscoder>,
}

impl ConversionJob {
    pub fn new(
        options: &WorkflowOptions,
        output_dir: impl Into<PathBuf>,
        media_path: Option<PathBuf>,
        image_codec: Arc<dyn ImageCodec>,
        transcoder: Arc<dyn VideoTranscoder>,
    ) -> Self {
        let image_target = if options.wants_image_conversion() {
            options.conversion.image_container
        } else {
            None
        };
        Self {
            stem: options.stem.clone(),
            output_dir: output_dir.into(),
            media_path,
            image_target,
            video_codec: options.conversion.video_codec,
            video_container: options.conversion.video_container,
            image_codec,
            transcoder,
        }
    }

    fn wants_video(&self) -> bool {
        self.video_codec.is_some() || self.video_container.is_some()
    }

    fn artifact_path(&self, ext: &str) -> PathBuf {
        self.output_dir.join(format!("{}.{}", self.stem, ext))
    }

    fn convert_thumbnail(
        &self,
        target_format: ImageContainer,
        ctx: &mut JobContext,
    ) -> Result<PathBuf, WorkflowError> {
        let source = find_artifact(&self.output_dir, &self.stem, THUMBNAIL_SOURCE_EXTENSIONS)
            .ok_or_else(|| WorkflowError::SourceArtifactNotFound {
                stem: self.stem.clone(),
                searched: THUMBNAIL_SOURCE_EXTENSIONS
                    .iter()
                    .map(|ext| self.artifact_path(ext).display().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            })?;
        ctx.report(IMAGE_STARTED)?;

        let target = self.artifact_path(target_format.as_str());
        tracing::debug!(
            source = %source.display(),
            target = %target.display(),
            "converting thumbnail"
        );
        let image = self
            .image_codec
            .decode(&source)
            .map_err(|e| JobKind::Conversion.failure_from(e))?;
        ctx.checkpoint()?;
        self.image_codec
            .encode(&image, &target)
            .map_err(|e| JobKind::Conversion.failure_from(e))?;
        ctx.report(IMAGE_DONE)?;

        if source != target {
            if let Err(e) = fs::remove_file(&source) {
                tracing::warn!(
                    path = %source.display(),
                    "could not remove converted thumbnail source: {e}"
                );
            }
        }
        Ok(target)
    }

    fn transcode_video(&self, offset: u8, ctx: &mut JobContext) -> Result<PathBuf, WorkflowError> {
        ctx.report(offset + VIDEO_STARTED_STEP)?;
        let source = self
            .media_path
            .as_deref()
            .filter(|p| p.is_file())
            .ok_or_else(|| WorkflowError::SourceArtifactNotFound {
                stem: self.stem.clone(),
                searched: self
                    .media_path
                    .as_deref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "acquired media (none was downloaded)".to_string()),
            })?;

        let ext = match self.video_container {
            Some(container) => container.as_str().to_string(),
            None => source_extension(source),
        };
        let target = self.artifact_path(&ext);
        tracing::info!(
            source = %source.display(),
            target = %target.display(),
            codec = self.video_codec.map(|c| c.as_str()).unwrap_or("auto"),
            "transcoding video"
        );
        self.transcoder
            .transcode(source, &target, self.video_codec, ctx.cancel_token())
            .map_err(|e| JobKind::Conversion.failure_from(e))?;
        Ok(target)
    }
}

fn source_extension(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| VideoContainer::Mp4.as_str().to_string())
}

impl Job for ConversionJob {
    fn kind(&self) -> JobKind {
        JobKind::Conversion
    }

    fn run(self: Box<Self>, ctx: &mut JobContext) -> Result<JobOutput, WorkflowError> {
        let mut artifacts = Vec::new();
        let mut offset = 0;

        if let Some(target_format) = self.image_target {
            artifacts.push(self.convert_thumbnail(target_format, ctx)?);
            offset = IMAGE_DONE;
        }
        ctx.checkpoint()?;
        if self.wants_video() {
            artifacts.push(self.transcode_video(offset, ctx)?);
        }

        ctx.report(100)?;
        Ok(JobOutput::Converted { artifacts })
    }
}
