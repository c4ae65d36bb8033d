//! Small JPEG previews stored alongside history entries.

use anyhow::{Context, Result, anyhow};
use base64::Engine;

use crate::config::ThumbnailConfig;

/// Decodes `bytes`, shrinks the image to fit `config`'s bounding box and
/// returns it as a `data:image/jpeg;base64,...` URL.
///
/// Aspect ratio is preserved and images already inside the box are never
/// upscaled.
///
/// # Errors
/// Returns an error if the image cannot be decoded, resized, or encoded.
pub fn create_thumbnail(bytes: &[u8], config: &ThumbnailConfig) -> Result<String> {
    let reader = image::ImageReader::new(std::io::Cursor::new(bytes))
        .with_guessed_format()
        .context("Failed to detect image format")?;
    let img = reader.decode().context("Failed to decode image")?;

    let (dst_w, dst_h) = fit_within(
        (img.width(), img.height()),
        (config.max_width, config.max_height),
    );
    let resized = resize_image(&img, dst_w, dst_h)?;
    let jpeg = encode_jpeg(&resized, config.quality)?;

    Ok(format!(
        "data:image/jpeg;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(jpeg)
    ))
}

/// Target dimensions for `src` scaled to fit inside `max`, never larger
/// than `src` and never zero.
pub fn fit_within(src: (u32, u32), max: (u32, u32)) -> (u32, u32) {
    let (w, h) = (src.0.max(1), src.1.max(1));
    let (max_w, max_h) = (max.0.max(1), max.1.max(1));
    if w <= max_w && h <= max_h {
        return (w, h);
    }

    let scale = f64::min(
        f64::from(max_w) / f64::from(w),
        f64::from(max_h) / f64::from(h),
    );
    let scaled = |v: u32| ((f64::from(v) * scale).round() as u32).max(1);
    (scaled(w).min(max_w), scaled(h).min(max_h))
}

fn resize_image(src: &image::DynamicImage, dst_w: u32, dst_h: u32) -> Result<image::DynamicImage> {
    use fast_image_resize as fir;

    if src.width() == dst_w && src.height() == dst_h {
        return Ok(src.clone());
    }

    let src_rgba = src.to_rgba8();
    let (src_w, src_h) = src_rgba.dimensions();

    let src_image =
        fir::images::Image::from_vec_u8(src_w, src_h, src_rgba.into_raw(), fir::PixelType::U8x4)
            .context("Failed to prepare image for resizing")?;

    let mut dst_image = fir::images::Image::new(dst_w, dst_h, fir::PixelType::U8x4);
    let options = fir::ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::Bilinear));
    fir::Resizer::new()
        .resize(&src_image, &mut dst_image, Some(&options))
        .context("Failed to resize image")?;

    let rgba = image::RgbaImage::from_raw(dst_w, dst_h, dst_image.into_vec())
        .ok_or_else(|| anyhow!("Resized image buffer has the wrong size"))?;
    Ok(image::DynamicImage::ImageRgba8(rgba))
}

fn encode_jpeg(img: &image::DynamicImage, quality: u8) -> Result<Vec<u8>> {
    use image::ImageEncoder as _;
    use image::codecs::jpeg::JpegEncoder;

    let rgb = img.to_rgb8();
    let (w, h) = rgb.dimensions();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100))
        .write_image(rgb.as_raw(), w, h, image::ExtendedColorType::Rgb8)
        .context("Failed to encode JPEG thumbnail")?;
    Ok(buf)
}
