//! Image decode/encode behind the codec seam.
//!
//! The production codec wraps the `image` crate. Each decode or encode runs
//! inside a `tokio::task::spawn_blocking` call so the async runtime is never
//! blocked on pixel work.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::core::{Bitmap, Blob, JPEG_MIME};
use crate::utils::{CompressorError, CompressorResult};

/// Decode and re-encode primitives, swappable for hosts with their own
/// codecs and for tests that need to control completion timing.
#[async_trait]
pub trait ImageCodec: Send + Sync {
    /// Raw file bytes → RGBA bitmap with known dimensions.
    async fn decode(&self, bytes: Arc<Vec<u8>>) -> CompressorResult<Bitmap>;

    /// Bitmap → JPEG bytes at the given quality fraction in [0, 1].
    async fn encode_jpeg(&self, bitmap: &Bitmap, quality: f64) -> CompressorResult<Vec<u8>>;
}

/// Maps a quality fraction onto the encoder's 1-100 scale.
pub(crate) fn jpeg_quality(fraction: f64) -> u8 {
    (fraction * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Production codec backed by the `image` crate.
///
/// Output is always JPEG; alpha channels are dropped during the RGB
/// conversion, so transparency does not survive re-encoding.
#[derive(Debug, Default)]
pub struct ImageRsCodec;

#[async_trait]
impl ImageCodec for ImageRsCodec {
    async fn decode(&self, bytes: Arc<Vec<u8>>) -> CompressorResult<Bitmap> {
        tokio::task::spawn_blocking(move || {
            let dynamic = image::load_from_memory(&bytes)
                .map_err(|e| CompressorError::decode(e.to_string()))?;
            let rgba = dynamic.to_rgba8();
            let (width, height) = rgba.dimensions();
            debug!("Decoded {}x{} image ({} bytes in)", width, height, bytes.len());
            Ok(Bitmap::new(width, height, rgba.into_raw()))
        })
        .await
        .map_err(|e| CompressorError::decode(format!("Decode task failed: {}", e)))?
    }

    async fn encode_jpeg(&self, bitmap: &Bitmap, quality: f64) -> CompressorResult<Vec<u8>> {
        let bitmap = bitmap.clone();
        let quality = jpeg_quality(quality);
        tokio::task::spawn_blocking(move || {
            let (width, height) = (bitmap.width, bitmap.height);
            let rgba = image::RgbaImage::from_raw(width, height, bitmap.pixels().to_vec())
                .ok_or_else(|| {
                    CompressorError::encode(format!(
                        "Bitmap buffer does not match {}x{} RGBA dimensions",
                        width, height
                    ))
                })?;
            let rgb = image::DynamicImage::ImageRgba8(rgba).to_rgb8();

            let mut buf = Vec::new();
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
            encoder
                .encode(rgb.as_raw(), width, height, image::ExtendedColorType::Rgb8)
                .map_err(|e| CompressorError::encode(e.to_string()))?;
            debug!(
                "Encoded {}x{} at quality {} ({} bytes out)",
                width,
                height,
                quality,
                buf.len()
            );
            Ok(buf)
        })
        .await
        .map_err(|e| CompressorError::encode(format!("Encode task failed: {}", e)))?
    }
}

/// Wraps freshly encoded bytes as a JPEG blob.
pub(crate) fn jpeg_blob(bytes: Vec<u8>) -> Blob {
    Blob::new(bytes, JPEG_MIME)
}
