//! Pure option reducer: `(current options, user action) -> new options`.
//!
//! Exclusivity rules:
//! - MergedVideoAudio and AudioOnly exclude each other; turning one on turns
//!   the other off.
//! - Switching the media target clears the selected format.
//! - A format can only be selected while the target is MergedVideoAudio, and
//!   never an audio-only one; other selections leave the options unchanged.
//! - Without a media target, requesting description or thumbnail makes the
//!   target AuxiliaryOnly; clearing both makes it None again.

use super::{ImageContainer, TargetKind, VideoCodec, VideoContainer, WorkflowOptions};
use crate::format::FormatDescriptor;

/// One user interaction with the option surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionAction {
    MergedVideoAudio(bool),
    AudioOnly(bool),
    SelectFormat(Option<FormatDescriptor>),
    Description(bool),
    Thumbnail(bool),
    VideoCodec(Option<VideoCodec>),
    VideoContainer(Option<VideoContainer>),
    ImageContainer(Option<ImageContainer>),
}

impl OptionAction {
    /// Conversion actions are the ones still accepted on the Convert stage.
    pub fn is_conversion(&self) -> bool {
        matches!(
            self,
            OptionAction::VideoCodec(_)
                | OptionAction::VideoContainer(_)
                | OptionAction::ImageContainer(_)
        )
    }
}

fn side_artifact_target(options: &WorkflowOptions) -> TargetKind {
    if options.write_description || options.write_thumbnail {
        TargetKind::AuxiliaryOnly
    } else {
        TargetKind::None
    }
}

fn switch_media(mut options: WorkflowOptions, target: TargetKind, on: bool) -> WorkflowOptions {
    if on {
        if options.target != target {
            options.selected = None;
        }
        options.target = target;
    } else if options.target == target {
        options.selected = None;
        options.target = side_artifact_target(&options);
    }
    options
}

pub fn reduce(options: &WorkflowOptions, action: OptionAction) -> WorkflowOptions {
    let mut next = options.clone();
    match action {
        OptionAction::MergedVideoAudio(on) => {
            return switch_media(next, TargetKind::MergedVideoAudio, on);
        }
        OptionAction::AudioOnly(on) => {
            return switch_media(next, TargetKind::AudioOnly, on);
        }
        OptionAction::SelectFormat(Some(descriptor)) => {
            if next.target == TargetKind::MergedVideoAudio && !descriptor.is_audio_only {
                next.selected = Some(descriptor);
            }
        }
        OptionAction::SelectFormat(None) => next.selected = None,
        OptionAction::Description(on) => next.write_description = on,
        OptionAction::Thumbnail(on) => next.write_thumbnail = on,
        OptionAction::VideoCodec(codec) => next.conversion.video_codec = codec,
        OptionAction::VideoContainer(container) => next.conversion.video_container = container,
        OptionAction::ImageContainer(container) => next.conversion.image_container = container,
    }
    if !next.target.downloads_media() {
        next.target = side_artifact_target(&next);
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(id: &str, audio_only: bool) -> FormatDescriptor {
        FormatDescriptor {
            id: id.to_string(),
            container: "mp4".to_string(),
            resolution_label: if audio_only { "audio only" } else { "1080p" }.to_string(),
            approximate_size: "10.0 MB".to_string(),
            codec_note: "avc1".to_string(),
            is_audio_only: audio_only,
        }
    }

    fn apply_all(actions: Vec<OptionAction>) -> WorkflowOptions {
        actions
            .into_iter()
            .fold(WorkflowOptions::new("stem"), |opts, a| reduce(&opts, a))
    }

    #[test]
    fn merged_and_audio_are_mutually_exclusive() {
        let opts = apply_all(vec![
            OptionAction::MergedVideoAudio(true),
            OptionAction::AudioOnly(true),
        ]);
        assert_eq!(opts.target, TargetKind::AudioOnly);
        let opts = reduce(&opts, OptionAction::MergedVideoAudio(true));
        assert_eq!(opts.target, TargetKind::MergedVideoAudio);
    }

    #[test]
    fn switching_media_clears_selection() {
        let opts = apply_all(vec![
            OptionAction::MergedVideoAudio(true),
            OptionAction::SelectFormat(Some(descriptor("137", false))),
        ]);
        assert!(opts.selected.is_some());
        let opts = reduce(&opts, OptionAction::AudioOnly(true));
        assert!(opts.selected.is_none());
    }

    #[test]
    fn selection_requires_merged_target_and_video_descriptor() {
        let opts = reduce(
            &WorkflowOptions::new("stem"),
            OptionAction::SelectFormat(Some(descriptor("137", false))),
        );
        assert!(opts.selected.is_none());

        let opts = apply_all(vec![
            OptionAction::MergedVideoAudio(true),
            OptionAction::SelectFormat(Some(descriptor("251", true))),
        ]);
        assert!(opts.selected.is_none());
    }

    #[test]
    fn side_artifacts_alone_mean_auxiliary_only() {
        let opts = apply_all(vec![OptionAction::Thumbnail(true)]);
        assert_eq!(opts.target, TargetKind::AuxiliaryOnly);
        let opts = reduce(&opts, OptionAction::Thumbnail(false));
        assert_eq!(opts.target, TargetKind::None);
    }

    #[test]
    fn side_artifacts_do_not_override_media_target() {
        let opts = apply_all(vec![
            OptionAction::AudioOnly(true),
            OptionAction::Description(true),
        ]);
        assert_eq!(opts.target, TargetKind::AudioOnly);
        assert!(opts.write_description);
    }

    #[test]
    fn unchecking_media_falls_back_to_side_artifacts() {
        let opts = apply_all(vec![
            OptionAction::Description(true),
            OptionAction::MergedVideoAudio(true),
            OptionAction::MergedVideoAudio(false),
        ]);
        assert_eq!(opts.target, TargetKind::AuxiliaryOnly);
    }

    #[test]
    fn unchecking_inactive_media_is_a_no_op() {
        let opts = apply_all(vec![
            OptionAction::MergedVideoAudio(true),
            OptionAction::AudioOnly(false),
        ]);
        assert_eq!(opts.target, TargetKind::MergedVideoAudio);
    }

    #[test]
    fn conversion_actions_set_sub_options() {
        let opts = apply_all(vec![
            OptionAction::VideoCodec(Some(VideoCodec::Vp9)),
            OptionAction::VideoContainer(Some(VideoContainer::Webm)),
            OptionAction::ImageContainer(Some(ImageContainer::Png)),
            OptionAction::VideoCodec(None),
        ]);
        assert_eq!(opts.conversion.video_codec, None);
        assert_eq!(opts.conversion.video_container, Some(VideoContainer::Webm));
        assert_eq!(opts.conversion.image_container, Some(ImageContainer::Png));
        assert!(OptionAction::VideoCodec(None).is_conversion());
        assert!(!OptionAction::Thumbnail(true).is_conversion());
    }
}
