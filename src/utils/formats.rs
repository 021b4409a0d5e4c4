use serde::{Deserialize, Serialize};
use std::str::FromStr;
use crate::utils::CompressorError;

/// Output image formats the exporter can name files for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    JPEG,
    PNG,
    WebP,
}

impl ImageFormat {
    /// Get the MIME type for this format
    pub fn mime(&self) -> &'static str {
        match self {
            Self::JPEG => "image/jpeg",
            Self::PNG => "image/png",
            Self::WebP => "image/webp",
        }
    }

    /// Get file extensions associated with this format
    pub fn extensions(&self) -> &[&str] {
        match self {
            Self::JPEG => &["jpg", "jpeg"],
            Self::PNG => &["png"],
            Self::WebP => &["webp"],
        }
    }

    /// Get the primary extension for this format
    pub fn primary_extension(&self) -> &str {
        self.extensions()[0]
    }

    /// Resolve a format from a MIME type string
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/jpeg" => Some(Self::JPEG),
            "image/png" => Some(Self::PNG),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }
}

impl FromStr for ImageFormat {
    type Err = CompressorError;

    fn from_str(ext: &str) -> Result<Self, Self::Err> {
        let ext = ext.to_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Ok(Self::JPEG),
            "png" => Ok(Self::PNG),
            "webp" => Ok(Self::WebP),
            _ => Err(CompressorError::encode(format!(
                "Unsupported image format: {}", ext
            ))),
        }
    }
}

/// Format a byte count as a human-readable size string.
///
/// Uses binary (1024) units with Bytes/KB/MB/GB labels. The Bytes tier is
/// exact; larger tiers render with two decimal places.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    // floor(log_1024(bytes)), clamped to the largest labeled unit
    let tier = ((bytes.ilog2() / 10) as usize).min(UNITS.len() - 1);
    if tier == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        let value = bytes as f64 / (1u64 << (10 * tier)) as f64;
        format!("{:.2} {}", value, UNITS[tier])
    }
}

/// Strip the final extension from a filename.
///
/// Mirrors the download naming rule: only the last `.suffix` is removed, so
/// `archive.tar.gz` becomes `archive.tar` and extensionless names pass
/// through unchanged.
pub fn file_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(pos) if pos > 0 && pos + 1 < name.len() => &name[..pos],
        _ => name,
    }
}

/// Derive the download filename for a compressed blob.
///
/// `compressed_<stem>.<ext>` where the extension comes from the blob's MIME
/// type, falling back to `jpg` for anything unrecognized.
pub fn output_filename(original_name: &str, blob_mime: &str) -> String {
    let ext = ImageFormat::from_mime(blob_mime)
        .map(|f| f.primary_extension().to_string())
        .unwrap_or_else(|| "jpg".to_string());
    format!("compressed_{}.{}", file_stem(original_name), ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_size_zero_is_verbatim() {
        assert_eq!(format_size(0), "0 Bytes");
    }

    #[test]
    fn format_size_bytes_tier_is_exact() {
        assert_eq!(format_size(1), "1 Bytes");
        assert_eq!(format_size(512), "512 Bytes");
        assert_eq!(format_size(1023), "1023 Bytes");
    }

    #[test]
    fn format_size_selects_largest_unit() {
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1024 * 1024), "1.00 MB");
        assert_eq!(format_size(5 * 1024 * 1024 * 1024), "5.00 GB");
    }

    #[test]
    fn format_size_clamps_to_gb() {
        // Beyond the largest labeled tier the value keeps growing in GB.
        assert_eq!(format_size(2048 * 1024 * 1024 * 1024), "2048.00 GB");
    }

    #[test]
    fn file_stem_strips_last_extension_only() {
        assert_eq!(file_stem("photo.png"), "photo");
        assert_eq!(file_stem("archive.tar.gz"), "archive.tar");
        assert_eq!(file_stem("noext"), "noext");
        assert_eq!(file_stem(".hidden"), ".hidden");
    }

    #[test]
    fn output_filename_uses_blob_mime_extension() {
        assert_eq!(output_filename("photo.png", "image/jpeg"), "compressed_photo.jpg");
        assert_eq!(output_filename("pic.jpeg", "image/jpeg"), "compressed_pic.jpg");
        assert_eq!(output_filename("scan", "application/octet-stream"), "compressed_scan.jpg");
    }

    #[test]
    fn format_from_extension_round_trip() {
        assert_eq!("jpg".parse::<ImageFormat>().unwrap(), ImageFormat::JPEG);
        assert_eq!("JPEG".parse::<ImageFormat>().unwrap(), ImageFormat::JPEG);
        assert!("tiff".parse::<ImageFormat>().is_err());
        assert_eq!(ImageFormat::JPEG.mime(), "image/jpeg");
        assert_eq!(ImageFormat::JPEG.primary_extension(), "jpg");
    }
}
