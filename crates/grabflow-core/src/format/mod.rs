//! Format descriptors: the selectable acquisition variants of one source.
//!
//! Raw entries come from the extractor (yt-dlp's `formats` array); discovery
//! keeps the video-capable and pure-audio ones, renders them as descriptors
//! and orders them largest first.

pub mod size;

use serde::Deserialize;

pub use size::{approximate_size, format_size, size_to_kb};

/// Resolution label given to audio-only descriptors.
pub const AUDIO_ONLY_LABEL: &str = "audio only";

const NOT_AVAILABLE: &str = "N/A";

/// One format entry as reported by the extractor. Every field is optional on
/// the wire; `"none"` in a codec field means the stream is absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFormat {
    #[serde(default)]
    pub format_id: String,
    pub ext: Option<String>,
    pub format_note: Option<String>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
    pub filesize: Option<f64>,
    pub filesize_approx: Option<f64>,
}

impl RawFormat {
    fn has_video(&self) -> bool {
        self.vcodec.as_deref() != Some("none")
    }

    pub fn is_audio_only(&self) -> bool {
        self.vcodec.as_deref() == Some("none") && self.acodec.as_deref() != Some("none")
    }

    /// Video-capable or genuinely audio-only; storyboards and the like are not.
    pub fn is_selectable(&self) -> bool {
        self.has_video() || self.is_audio_only()
    }

    fn size_bytes(&self) -> Option<f64> {
        self.filesize.or(self.filesize_approx)
    }
}

/// Immutable description of one selectable variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatDescriptor {
    /// Opaque selector understood by the extractor.
    pub id: String,
    /// File extension of the variant.
    pub container: String,
    /// e.g. "1080p", or [`AUDIO_ONLY_LABEL`].
    pub resolution_label: String,
    /// Approximate, possibly jittered; never treat as exact.
    pub approximate_size: String,
    /// Video codec, or audio codec for audio-only variants.
    pub codec_note: String,
    pub is_audio_only: bool,
}

impl FormatDescriptor {
    pub fn from_raw(raw: &RawFormat, size_jitter: bool) -> Self {
        let is_audio_only = raw.is_audio_only();
        let or_na = |v: &Option<String>| v.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string());
        Self {
            id: raw.format_id.clone(),
            container: or_na(&raw.ext),
            resolution_label: if is_audio_only {
                AUDIO_ONLY_LABEL.to_string()
            } else {
                or_na(&raw.format_note)
            },
            approximate_size: approximate_size(raw.size_bytes(), size_jitter),
            codec_note: if is_audio_only {
                or_na(&raw.acodec)
            } else {
                or_na(&raw.vcodec)
            },
            is_audio_only,
        }
    }

    /// Sort key: the displayed size parsed back to kilobytes (0 when unknown).
    pub fn size_kb(&self) -> f64 {
        size_to_kb(&self.approximate_size)
    }
}

/// Filters raw entries down to selectable descriptors, largest first.
pub fn describe_formats(raw: &[RawFormat], size_jitter: bool) -> Vec<FormatDescriptor> {
    let mut descriptors: Vec<FormatDescriptor> = raw
        .iter()
        .filter(|f| f.is_selectable())
        .map(|f| FormatDescriptor::from_raw(f, size_jitter))
        .collect();
    descriptors.sort_by(|a, b| b.size_kb().total_cmp(&a.size_kb()));
    descriptors
}
