//! Image codec collaborator used by thumbnail conversion.

use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat, ImageReader};
use std::path::Path;

pub trait ImageCodec: Send + Sync {
    fn decode(&self, path: &Path) -> Result<DynamicImage>;

    /// Encodes to the format implied by `path`'s extension.
    fn encode(&self, image: &DynamicImage, path: &Path) -> Result<()>;
}

/// Codec backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateCodec;

impl ImageCodec for ImageCrateCodec {
    fn decode(&self, path: &Path) -> Result<DynamicImage> {
        let reader = ImageReader::open(path)
            .with_context(|| format!("open {}", path.display()))?
            .with_guessed_format()
            .with_context(|| format!("sniff format of {}", path.display()))?;
        reader
            .decode()
            .with_context(|| format!("decode {}", path.display()))
    }

    fn encode(&self, image: &DynamicImage, path: &Path) -> Result<()> {
        let format = ImageFormat::from_path(path)
            .with_context(|| format!("no image format for {}", path.display()))?;
        // JPEG has no alpha channel.
        let result = if format == ImageFormat::Jpeg {
            DynamicImage::ImageRgb8(image.to_rgb8()).save_with_format(path, format)
        } else {
            image.save_with_format(path, format)
        };
        result.with_context(|| format!("encode {}", path.display()))
    }
}
