//! Image input handling: loading, media type detection, thumbnails.

pub mod path_mime;
pub mod thumbnail;

use std::path::Path;

use anyhow::{Context, Result, bail};

pub use path_mime::{SUPPORTED_IMAGE_MIMES, detect_image_mime, mime_type_for_extension, normalize_input_path};
pub use thumbnail::create_thumbnail;

/// A photo ready to be sent to the model.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

impl SourceImage {
    /// Wraps raw bytes, checking they are a supported image type.
    ///
    /// The declared type (usually from a file extension) wins when it is
    /// supported; otherwise the content is sniffed.
    ///
    /// # Errors
    /// Returns an error if the bytes are empty or not a supported image.
    pub fn from_bytes(bytes: Vec<u8>, declared: Option<&'static str>) -> Result<Self> {
        if bytes.is_empty() {
            bail!("Image is empty");
        }

        let mime_type = declared
            .filter(|mime| SUPPORTED_IMAGE_MIMES.contains(mime))
            .or_else(|| detect_image_mime(&bytes))
            .with_context(|| {
                format!(
                    "Unsupported image type. Supported: {}",
                    SUPPORTED_IMAGE_MIMES.join(", ")
                )
            })?;

        Ok(Self { bytes, mime_type })
    }

    /// Reads and validates an image file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not a supported image.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read image {}", path.display()))?;
        Self::from_bytes(bytes, mime_type_for_extension(path))
            .with_context(|| format!("Cannot use {} as a plant photo", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    const PNG_MAGIC: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn test_load_uses_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("leaf.webp");
        fs::write(&path, b"anything").unwrap();

        let image = SourceImage::load(&path).unwrap();
        assert_eq!(image.mime_type, "image/webp");
    }

    #[test]
    fn test_load_sniffs_unknown_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("leaf.upload");
        fs::write(&path, PNG_MAGIC).unwrap();

        let image = SourceImage::load(&path).unwrap();
        assert_eq!(image.mime_type, "image/png");
    }

    #[test]
    fn test_load_rejects_non_images() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "just text").unwrap();

        let err = SourceImage::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Unsupported image type"));
    }

    #[test]
    fn test_empty_image_is_rejected() {
        assert!(SourceImage::from_bytes(Vec::new(), Some("image/png")).is_err());
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = SourceImage::load(Path::new("/nonexistent/leaf.png")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/leaf.png"));
    }
}
