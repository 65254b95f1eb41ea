//! JPEG compression of uploaded images.

use fasal_core::{defaults, CompressedImage, Error, ImageCompressor, InputError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use tracing::debug;

/// Downsizes to fit a bounding box and re-encodes as JPEG.
///
/// Images already inside the box keep their size; larger ones are scaled
/// with aspect ratio preserved.
#[derive(Debug, Clone, Copy)]
pub struct JpegCompressor {
    max_width: u32,
    max_height: u32,
    quality: u8,
}

impl Default for JpegCompressor {
    fn default() -> Self {
        Self {
            max_width: defaults::IMAGE_MAX_WIDTH,
            max_height: defaults::IMAGE_MAX_HEIGHT,
            quality: defaults::IMAGE_JPEG_QUALITY,
        }
    }
}

impl JpegCompressor {
    pub fn new(max_width: u32, max_height: u32, quality: u8) -> Self {
        Self {
            max_width,
            max_height,
            quality: quality.clamp(1, 100),
        }
    }
}

impl ImageCompressor for JpegCompressor {
    fn compress(&self, bytes: &[u8]) -> Result<CompressedImage> {
        let decoded = image::load_from_memory(bytes).map_err(|e| {
            debug!(error = %e, "Upload did not decode as an image");
            Error::Input(InputError::Unreadable)
        })?;

        let (src_w, src_h) = (decoded.width(), decoded.height());
        let bounded = if src_w > self.max_width || src_h > self.max_height {
            decoded.resize(self.max_width, self.max_height, FilterType::Triangle)
        } else {
            decoded
        };

        // JPEG has no alpha channel.
        let rgb = bounded.to_rgb8();
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, self.quality)
            .encode_image(&rgb)
            .map_err(|e| Error::Internal(format!("JPEG encoding failed: {}", e)))?;

        debug!(
            src_width = src_w,
            src_height = src_h,
            width = rgb.width(),
            height = rgb.height(),
            bytes = out.len(),
            "Compressed upload"
        );
        Ok(CompressedImage {
            mime_type: defaults::COMPRESSED_MIME.to_string(),
            bytes: out,
            width: rgb.width(),
            height: rgb.height(),
        })
    }
}
