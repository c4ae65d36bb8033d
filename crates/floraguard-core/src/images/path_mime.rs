//! Path normalization + MIME helpers for image files.

use std::path::{Path, PathBuf};

/// Media types the diagnosis model accepts.
pub const SUPPORTED_IMAGE_MIMES: &[&str] = &["image/png", "image/jpeg", "image/webp", "image/gif"];

/// Normalizes user-provided file paths.
///
/// Handles common drag-and-drop shell escaping (`\ `, `\(`, `\)`) and
/// expands `~/` to the HOME directory when available.
#[must_use]
pub fn normalize_input_path(path: &str) -> PathBuf {
    let unescaped = path
        .replace("\\ ", " ")
        .replace("\\(", "(")
        .replace("\\)", ")");

    if let Some(rest) = unescaped.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }

    PathBuf::from(unescaped)
}

/// Returns MIME type inferred from file extension for supported image formats.
#[must_use]
pub fn mime_type_for_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension().and_then(|e| e.to_str())?;

    match ext.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Detects a supported image MIME type from magic bytes.
#[must_use]
pub fn detect_image_mime(bytes: &[u8]) -> Option<&'static str> {
    let kind = infer::get(bytes)?;
    let mime = kind.mime_type();
    SUPPORTED_IMAGE_MIMES.iter().copied().find(|m| *m == mime)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_type_for_extension_is_case_insensitive() {
        assert_eq!(
            mime_type_for_extension(Path::new("leaf.JPG")),
            Some("image/jpeg")
        );
        assert_eq!(
            mime_type_for_extension(Path::new("a/b/leaf.webp")),
            Some("image/webp")
        );
        assert_eq!(mime_type_for_extension(Path::new("leaf.bmp")), None);
        assert_eq!(mime_type_for_extension(Path::new("leaf")), None);
    }

    #[test]
    fn test_detect_image_mime_from_magic_bytes() {
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert_eq!(detect_image_mime(&png), Some("image/png"));
        assert_eq!(detect_image_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(detect_image_mime(b"%PDF-1.7"), None);
        assert_eq!(detect_image_mime(&[]), None);
    }

    #[test]
    fn test_normalize_input_path_unescapes() {
        assert_eq!(
            normalize_input_path(r"my\ leaf\ \(1\).png"),
            PathBuf::from("my leaf (1).png")
        );
    }
}
