//! Result file naming, saving, and format conversion.

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::ImageError;
use crate::params::format_extension;

/// Build the output filename for one generated result.
///
/// Uses the source photo's stem and the style, both sanitized to kebab-case,
/// followed by a timestamp and the format's extension.
#[must_use]
pub fn result_filename(source: &Path, style: &str, format: &str) -> String {
    let stem = source.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    let stem = sanitize_for_filename(&stem, 40);
    let timestamp = Utc::now().format("%Y%m%d-%H%M%S%3f");
    let ext = format_extension(format);
    if style == "none" {
        format!("{stem}-{timestamp}.{ext}")
    } else {
        format!("{stem}-{}-{timestamp}.{ext}", sanitize_for_filename(style, 20))
    }
}

/// Sanitize a string for use in a filename.
///
/// Lowercases, turns runs of other characters into single hyphens, and
/// trims to `max_len`.
#[must_use]
pub fn sanitize_for_filename(input: &str, max_len: usize) -> String {
    let mut result = String::with_capacity(max_len);
    let mut last_was_hyphen = true;

    for ch in input.chars() {
        if result.len() >= max_len {
            break;
        }
        if ch.is_ascii_alphanumeric() {
            result.push(ch.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            result.push('-');
            last_was_hyphen = true;
        }
    }

    let trimmed = result.trim_end_matches('-');
    if trimmed.is_empty() {
        "image".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Save raw image bytes to a file, converting format if necessary.
///
/// # Errors
///
/// Returns an error if the file cannot be written or format conversion fails.
pub fn save_image(
    data: &[u8],
    source_mime: &str,
    target_format: &str,
    output_path: &Path,
) -> Result<(), ImageError> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    if mime_matches_format(source_mime, target_format) {
        std::fs::write(output_path, data).map_err(ImageError::Io)
    } else {
        convert_and_save(data, target_format, output_path)
    }
}

/// Check if a MIME type matches the requested output format.
fn mime_matches_format(mime: &str, format: &str) -> bool {
    matches!((mime, format), ("image/jpeg", "jpeg") | ("image/png", "png") | ("image/webp", "webp"))
}

/// Convert image bytes to the target format and save.
fn convert_and_save(
    data: &[u8],
    target_format: &str,
    output_path: &Path,
) -> Result<(), ImageError> {
    let img = image::load_from_memory(data)
        .map_err(|e| ImageError::ImageConversion(format!("Failed to decode image: {e}")))?;

    let image_format = match target_format {
        "jpeg" => image::ImageFormat::Jpeg,
        "png" => image::ImageFormat::Png,
        "webp" => image::ImageFormat::WebP,
        other => {
            return Err(ImageError::ImageConversion(format!("Unsupported format: {other}")));
        }
    };

    // JPEG has no alpha channel.
    let img = if image_format == image::ImageFormat::Jpeg {
        image::DynamicImage::ImageRgb8(img.to_rgb8())
    } else {
        img
    };

    img.save_with_format(output_path, image_format)
        .map_err(|e| ImageError::ImageConversion(format!("Failed to save as {target_format}: {e}")))
}

/// Output path for a result: `dir` (or the current directory) plus an
/// auto-generated name.
#[must_use]
pub fn resolve_output_path(dir: Option<&Path>, source: &Path, style: &str, format: &str) -> PathBuf {
    let name = result_filename(source, style, format);
    match dir {
        Some(d) => d.join(name),
        None => PathBuf::from(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_basic() {
        assert_eq!(sanitize_for_filename("Hello World", 50), "hello-world");
    }

    #[test]
    fn sanitize_special_chars() {
        assert_eq!(sanitize_for_filename("IMG_2041 (copy)", 50), "img-2041-copy");
    }

    #[test]
    fn sanitize_truncates() {
        let long = "a".repeat(100);
        assert!(sanitize_for_filename(&long, 10).len() <= 10);
    }

    #[test]
    fn sanitize_empty() {
        assert_eq!(sanitize_for_filename("", 50), "image");
        assert_eq!(sanitize_for_filename("!!!", 50), "image");
    }

    #[test]
    fn filename_includes_stem_and_style() {
        let name = result_filename(Path::new("/photos/My Cat.PNG"), "oil-painting", "jpeg");
        assert!(name.starts_with("my-cat-oil-painting-"), "{name}");
        assert_eq!(Path::new(&name).extension().unwrap(), "jpg");
    }

    #[test]
    fn filename_without_style() {
        let name = result_filename(Path::new("dog.jpg"), "none", "webp");
        assert!(name.starts_with("dog-2"), "{name}");
        assert_eq!(Path::new(&name).extension().unwrap(), "webp");
    }

    #[test]
    fn resolve_in_directory() {
        let path = resolve_output_path(Some(Path::new("out")), Path::new("a.png"), "sketch", "png");
        assert!(path.starts_with("out"));
        assert_eq!(path.extension().unwrap(), "png");
    }

    #[test]
    fn mime_matches() {
        assert!(mime_matches_format("image/jpeg", "jpeg"));
        assert!(mime_matches_format("image/png", "png"));
        assert!(mime_matches_format("image/webp", "webp"));
        assert!(!mime_matches_format("image/jpeg", "png"));
    }

    #[test]
    fn converts_png_to_jpeg() {
        let png = {
            let img = image::DynamicImage::new_rgba8(2, 2);
            let mut buf = std::io::Cursor::new(Vec::new());
            img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
            buf.into_inner()
        };
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("sub/out.jpg");
        save_image(&png, "image/png", "jpeg", &out).unwrap();
        let data = std::fs::read(&out).unwrap();
        assert_eq!(&data[..3], &[0xFF, 0xD8, 0xFF]);
    }
}
