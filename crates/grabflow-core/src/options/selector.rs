//! Acquisition parameters: format-selection expression and processing chain.

use super::{TargetKind, WorkflowOptions};
use crate::error::WorkflowError;

/// Height bound used when the resolution label carries no number.
pub const DEFAULT_MAX_HEIGHT: u32 = 2160;

/// Codec and bitrate of the audio-extraction step.
pub const AUDIO_CODEC: &str = "mp3";
pub const AUDIO_QUALITY_KBPS: u32 = 192;

const BEST_AUDIO: &str = "bestaudio/best";
const NO_MEDIA: &str = "none";

/// Leading integer of a resolution label ("1080p" -> 1080, "720p60" -> 720).
pub fn height_bound(resolution_label: &str) -> u32 {
    let digits: String = resolution_label
        .trim()
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits
        .parse::<u32>()
        .ok()
        .filter(|h| *h > 0)
        .unwrap_or(DEFAULT_MAX_HEIGHT)
}

/// Best video at or below `height` in `container` plus same-container audio,
/// falling back to any audio container.
pub fn merged_expression(height: u32, container: &str) -> String {
    format!(
        "bestvideo[height<={h}][ext={c}]+bestaudio[ext={c}]/bestvideo[height<={h}]+bestaudio",
        h = height,
        c = container
    )
}

/// What the extractor should fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatSelection {
    Expression(String),
    /// Side artifacts only.
    NoMedia,
}

impl FormatSelection {
    pub fn as_str(&self) -> &str {
        match self {
            FormatSelection::Expression(expr) => expr,
            FormatSelection::NoMedia => NO_MEDIA,
        }
    }

    pub fn downloads_media(&self) -> bool {
        matches!(self, FormatSelection::Expression(_))
    }
}

/// One step of the processing chain, executed by the extractor itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostProcessor {
    ConvertContainer { container: String },
    ExtractAudio { codec: String, quality_kbps: u32 },
}

impl PostProcessor {
    pub fn name(&self) -> &'static str {
        match self {
            PostProcessor::ConvertContainer { .. } => "convert-container",
            PostProcessor::ExtractAudio { .. } => "extract-audio",
        }
    }
}

/// Fully resolved acquisition parameters for one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionPlan {
    pub target: TargetKind,
    pub selection: FormatSelection,
    pub processing: Vec<PostProcessor>,
    pub write_description: bool,
    pub write_thumbnail: bool,
    pub stem: String,
}

impl AcquisitionPlan {
    pub fn from_options(options: &WorkflowOptions) -> Result<Self, WorkflowError> {
        let (selection, processing) = match options.target {
            TargetKind::None => {
                return Err(WorkflowError::validation(
                    "nothing to download: choose video+audio, audio only, description or thumbnail",
                ));
            }
            TargetKind::MergedVideoAudio => {
                let Some(selected) = options.selected.as_ref() else {
                    return Err(WorkflowError::validation(
                        "merged video+audio needs a selected format",
                    ));
                };
                let height = height_bound(&selected.resolution_label);
                (
                    FormatSelection::Expression(merged_expression(height, &selected.container)),
                    vec![PostProcessor::ConvertContainer {
                        container: selected.container.clone(),
                    }],
                )
            }
            TargetKind::AudioOnly => (
                FormatSelection::Expression(BEST_AUDIO.to_string()),
                vec![PostProcessor::ExtractAudio {
                    codec: AUDIO_CODEC.to_string(),
                    quality_kbps: AUDIO_QUALITY_KBPS,
                }],
            ),
            TargetKind::AuxiliaryOnly => (FormatSelection::NoMedia, Vec::new()),
        };

        Ok(Self {
            target: options.target,
            selection,
            processing,
            write_description: options.write_description,
            write_thumbnail: options.write_thumbnail,
            stem: options.stem.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::FormatDescriptor;

    fn selected(label: &str, container: &str) -> FormatDescriptor {
        FormatDescriptor {
            id: "137".to_string(),
            container: container.to_string(),
            resolution_label: label.to_string(),
            approximate_size: "N/A".to_string(),
            codec_note: "avc1".to_string(),
            is_audio_only: false,
        }
    }

    #[test]
    fn height_from_label() {
        assert_eq!(height_bound("1080p"), 1080);
        assert_eq!(height_bound("720p60"), 720);
        assert_eq!(height_bound("hd 1440p"), 1440);
    }

    #[test]
    fn height_defaults_without_digits() {
        assert_eq!(height_bound("audio only"), DEFAULT_MAX_HEIGHT);
        assert_eq!(height_bound("N/A"), 2160);
        assert_eq!(height_bound(""), 2160);
    }

    #[test]
    fn merged_expression_has_constrained_and_fallback_terms() {
        let expr = merged_expression(1080, "mp4");
        let (preferred, fallback) = expr.split_once('/').unwrap();
        assert!(preferred.contains("bestvideo[height<=1080][ext=mp4]"));
        assert!(preferred.contains("bestaudio[ext=mp4]"));
        assert_eq!(fallback, "bestvideo[height<=1080]+bestaudio");
    }

    #[test]
    fn merged_plan_converts_to_selected_container() {
        let mut opts = WorkflowOptions::new("clip");
        opts.target = TargetKind::MergedVideoAudio;
        opts.selected = Some(selected("1080p", "webm"));
        let plan = AcquisitionPlan::from_options(&opts).unwrap();
        assert_eq!(plan.selection.as_str(), merged_expression(1080, "webm"));
        assert_eq!(
            plan.processing,
            vec![PostProcessor::ConvertContainer {
                container: "webm".to_string()
            }]
        );
        assert_eq!(plan.stem, "clip");
    }

    #[test]
    fn audio_plan_extracts_mp3() {
        let mut opts = WorkflowOptions::new("clip");
        opts.target = TargetKind::AudioOnly;
        let plan = AcquisitionPlan::from_options(&opts).unwrap();
        assert_eq!(plan.selection.as_str(), "bestaudio/best");
        assert_eq!(plan.processing.len(), 1);
        assert_eq!(plan.processing[0].name(), "extract-audio");
    }

    #[test]
    fn auxiliary_plan_downloads_no_media() {
        let mut opts = WorkflowOptions::new("clip");
        opts.target = TargetKind::AuxiliaryOnly;
        opts.write_thumbnail = true;
        let plan = AcquisitionPlan::from_options(&opts).unwrap();
        assert_eq!(plan.selection, FormatSelection::NoMedia);
        assert_eq!(plan.selection.as_str(), "none");
        assert!(plan.processing.is_empty());
        assert!(plan.write_thumbnail);
    }

    #[test]
    fn none_target_and_missing_selection_are_rejected() {
        let opts = WorkflowOptions::new("clip");
        assert!(matches!(
            AcquisitionPlan::from_options(&opts),
            Err(WorkflowError::Validation(_))
        ));
        let mut opts = WorkflowOptions::new("clip");
        opts.target = TargetKind::MergedVideoAudio;
        assert!(matches!(
            AcquisitionPlan::from_options(&opts),
            Err(WorkflowError::Validation(_))
        ));
    }
}
