//! Core value types shared across intake, compression, and export.

use std::sync::Arc;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::utils::{CompressorResult, ValidationError};

/// MIME type of every compressed output blob.
pub const JPEG_MIME: &str = "image/jpeg";

/// Quality fraction applied to records before the host adjusts anything.
pub const DEFAULT_QUALITY: f64 = 0.8;

/// A file handed over by the host's picker or drop surface.
///
/// Carries the declared MIME type as reported by the host; intake filtering
/// trusts this declaration, decoding does not.
#[derive(Debug, Clone)]
pub struct PickedFile {
    /// Original filename including extension
    pub name: String,
    /// Declared MIME type (e.g. `image/png`)
    pub mime: String,
    /// Raw file bytes
    pub bytes: Vec<u8>,
}

impl PickedFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Whether the declared type claims to be an image.
    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

/// The retained source side of a record: name, declared MIME, raw bytes.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub mime: String,
    bytes: Arc<Vec<u8>>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes: Arc::new(bytes),
        }
    }

    /// Blob view of the original bytes, used for the host-side preview.
    pub fn as_blob(&self) -> Blob {
        Blob {
            bytes: Arc::clone(&self.bytes),
            mime: self.mime.clone(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn shared_bytes(&self) -> Arc<Vec<u8>> {
        Arc::clone(&self.bytes)
    }

    /// Size of the original file in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

impl Serialize for SourceFile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("SourceFile", 3)?;
        s.serialize_field("name", &self.name)?;
        s.serialize_field("mime", &self.mime)?;
        s.serialize_field("size", &self.size())?;
        s.end()
    }
}

/// A decoded image: RGBA8 pixel buffer with known dimensions.
///
/// The pixel buffer is shared so compression requests can snapshot it
/// without copying.
#[derive(Debug, Clone)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pixels: Arc<Vec<u8>>,
}

impl Bitmap {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels: Arc::new(pixels),
        }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Uncompressed footprint of the pixel buffer in bytes.
    pub fn raw_size(&self) -> u64 {
        self.pixels.len() as u64
    }
}

/// An encoded byte blob with its MIME type.
///
/// Serializes as `{ mime, size }`; the bytes themselves stay in-process and
/// hosts reach them through [`Blob::bytes`] to build previews or downloads.
#[derive(Debug, Clone)]
pub struct Blob {
    bytes: Arc<Vec<u8>>,
    mime: String,
}

impl Blob {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            bytes: Arc::new(bytes),
            mime: mime.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn shared_bytes(&self) -> Arc<Vec<u8>> {
        Arc::clone(&self.bytes)
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

impl Serialize for Blob {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Blob", 2)?;
        s.serialize_field("mime", &self.mime)?;
        s.serialize_field("size", &self.size())?;
        s.end()
    }
}

/// Validates a quality fraction before it touches any record.
pub fn validate_quality(fraction: f64) -> CompressorResult<()> {
    // NaN fails the range check as well
    if !(0.0..=1.0).contains(&fraction) {
        return Err(ValidationError::settings(format!(
            "Invalid quality fraction: {}. Must be between 0 and 1",
            fraction
        ))
        .into());
    }
    Ok(())
}

/// Quality fraction rendered as the percent label shown next to sliders.
pub fn quality_percent(fraction: f64) -> u32 {
    (fraction * 100.0).round() as u32
}
