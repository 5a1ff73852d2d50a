//! User selections for one workflow pass and the pure builders over them.
//!
//! `WorkflowOptions` is assembled incrementally through [`reduce`]; the
//! acquisition parameters are derived from a snapshot of it by
//! [`selector::AcquisitionPlan::from_options`].

pub mod reduce;
pub mod selector;
pub mod stem;

use std::fmt;
use std::str::FromStr;

use crate::format::FormatDescriptor;

pub use reduce::{reduce, OptionAction};
pub use selector::{AcquisitionPlan, FormatSelection, PostProcessor};
pub use stem::derive_stem;

/// What the acquisition step should fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TargetKind {
    /// No download-triggering selection has been made yet.
    #[default]
    None,
    MergedVideoAudio,
    AudioOnly,
    /// Only description and/or thumbnail, no media.
    AuxiliaryOnly,
}

impl TargetKind {
    pub fn downloads_media(self) -> bool {
        matches!(self, TargetKind::MergedVideoAudio | TargetKind::AudioOnly)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TargetKind::None => "none",
            TargetKind::MergedVideoAudio => "merged video+audio",
            TargetKind::AudioOnly => "audio only",
            TargetKind::AuxiliaryOnly => "auxiliary only",
        }
    }
}

macro_rules! choice_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $what:literal { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_lowercase();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == wanted)
                    .ok_or_else(|| {
                        let choices: Vec<&str> = $name::ALL.iter().map(|v| v.as_str()).collect();
                        format!(
                            "unknown {} '{}' (expected one of: {})",
                            $what,
                            s,
                            choices.join(", ")
                        )
                    })
            }
        }
    };
}

choice_enum!(
    /// Target video codec for re-encoding; `Copy` keeps the streams and only remuxes.
    VideoCodec, "video codec" {
        Libx264 => "libx264",
        Libx265 => "libx265",
        Vp9 => "vp9",
        Copy => "copy",
    }
);

choice_enum!(
    VideoContainer, "video container" {
        Mp4 => "mp4",
        Mkv => "mkv",
        Avi => "avi",
        Mov => "mov",
        Webm => "webm",
    }
);

choice_enum!(
    ImageContainer, "image format" {
        Png => "png",
        Jpg => "jpg",
        Webp => "webp",
    }
);

/// Post-acquisition conversion choices; `None` everywhere means "skip".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionOptions {
    pub video_codec: Option<VideoCodec>,
    pub video_container: Option<VideoContainer>,
    pub image_container: Option<ImageContainer>,
}

impl ConversionOptions {
    pub fn wants_video(&self) -> bool {
        self.video_codec.is_some() || self.video_container.is_some()
    }
}

/// Everything the user chose for one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowOptions {
    pub target: TargetKind,
    pub selected: Option<FormatDescriptor>,
    pub write_description: bool,
    pub write_thumbnail: bool,
    /// Derived once from the discovered title; shared by every artifact.
    pub stem: String,
    pub conversion: ConversionOptions,
}

impl WorkflowOptions {
    pub fn new(stem: impl Into<String>) -> Self {
        Self {
            target: TargetKind::None,
            selected: None,
            write_description: false,
            write_thumbnail: false,
            stem: stem.into(),
            conversion: ConversionOptions::default(),
        }
    }

    /// Image conversion only applies to a thumbnail the user asked for.
    pub fn wants_image_conversion(&self) -> bool {
        self.write_thumbnail && self.conversion.image_container.is_some()
    }

    pub fn wants_conversion(&self) -> bool {
        self.conversion.wants_video() || self.wants_image_conversion()
    }

    /// Whether a finished acquisition should be followed by the Convert stage.
    pub fn enters_convert_stage(&self) -> bool {
        self.target == TargetKind::MergedVideoAudio || self.write_thumbnail
    }
}
