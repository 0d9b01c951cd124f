//! Media metadata computation
//!
//! This module provides image format detection and the single
//! "compute metadata for path" entry point used during ingestion.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Image format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    /// JPEG format
    Jpeg,
    /// PNG format
    Png,
    /// BMP format
    Bmp,
    /// GIF format
    Gif,
    /// TIFF format
    Tiff,
    /// WebP format
    WebP,
    /// Unknown format
    Unknown,
}

impl ImageFormat {
    /// Detect image format from file extension
    pub fn from_extension(extension: &str) -> Self {
        match extension.to_lowercase().as_str() {
            "jpg" | "jpeg" => ImageFormat::Jpeg,
            "png" => ImageFormat::Png,
            "bmp" => ImageFormat::Bmp,
            "gif" => ImageFormat::Gif,
            "tiff" | "tif" => ImageFormat::Tiff,
            "webp" => ImageFormat::WebP,
            _ => ImageFormat::Unknown,
        }
    }

    /// Detect image format from magic bytes
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.len() < 8 {
            return ImageFormat::Unknown;
        }

        match bytes {
            // JPEG: FF D8 FF
            [0xFF, 0xD8, 0xFF, ..] => ImageFormat::Jpeg,

            // PNG: 89 50 4E 47 0D 0A 1A 0A
            [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, ..] => ImageFormat::Png,

            // BMP: 42 4D
            [0x42, 0x4D, ..] => ImageFormat::Bmp,

            // GIF: 47 49 46 38
            [0x47, 0x49, 0x46, 0x38, ..] => ImageFormat::Gif,

            // TIFF: 49 49 2A 00 or 4D 4D 00 2A
            [0x49, 0x49, 0x2A, 0x00, ..] | [0x4D, 0x4D, 0x00, 0x2A, ..] => ImageFormat::Tiff,

            // WebP: 52 49 46 46 ?? ?? ?? ?? 57 45 42 50
            [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => ImageFormat::WebP,

            _ => ImageFormat::Unknown,
        }
    }

    /// Detect image format for a file on disk
    ///
    /// Magic bytes are consulted first, falling back to the file extension.
    pub fn for_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let mut file = File::open(path)?;
        let mut header = [0u8; 16];
        let _ = file.read(&mut header)?;

        let format = ImageFormat::from_bytes(&header);
        if format != ImageFormat::Unknown {
            return Ok(format);
        }

        Ok(path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(ImageFormat::from_extension)
            .unwrap_or(ImageFormat::Unknown))
    }

    /// The MIME type for this format
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Bmp => "image/bmp",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Tiff => "image/tiff",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Unknown => "application/octet-stream",
        }
    }
}

/// Check whether a path has an image MIME type, judged by extension
pub fn is_image_path<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(ImageFormat::from_extension)
        .is_some_and(|format| format != ImageFormat::Unknown)
}

/// Metadata for an image on disk
///
/// Width and height are left unset; decoding image headers belongs to the
/// media I/O layer, not this core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    /// Size of the file on disk, in bytes
    pub size_bytes: u64,

    /// MIME type of the image
    pub mime_type: String,

    /// Image width, if known
    pub width: Option<u32>,

    /// Image height, if known
    pub height: Option<u32>,
}

impl ImageMetadata {
    /// Compute metadata for the image at the given path
    pub fn build_for<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let size_bytes = std::fs::metadata(path)?.len();
        let format = ImageFormat::for_path(path)?;

        Ok(Self {
            size_bytes,
            mime_type: format.mime_type().to_string(),
            width: None,
            height: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_format_from_magic_bytes() {
        assert_eq!(
            ImageFormat::from_bytes(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0]),
            ImageFormat::Jpeg
        );
        assert_eq!(
            ImageFormat::from_bytes(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
            ImageFormat::Png
        );
        assert_eq!(ImageFormat::from_bytes(&[0, 1, 2]), ImageFormat::Unknown);
    }

    #[test]
    fn test_is_image_path() {
        assert!(is_image_path("a.jpg"));
        assert!(is_image_path("dir/b.PNG"));
        assert!(!is_image_path("labels.json"));
        assert!(!is_image_path("noext"));
    }

    #[test]
    fn test_build_for_reads_size_and_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img.png");
        let mut file = File::create(&path).unwrap();
        file.write_all(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3])
            .unwrap();

        let metadata = ImageMetadata::build_for(&path).unwrap();
        assert_eq!(metadata.size_bytes, 11);
        assert_eq!(metadata.mime_type, "image/png");
        assert_eq!(metadata.width, None);
    }
}
