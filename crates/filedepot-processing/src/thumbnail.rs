//! Thumbnail rendering.

use filedepot_core::constants::THUMBNAIL_WIDTHS;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("Unrecognized image format")]
    UnknownFormat,

    #[error("Image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Image encode failed: {0}")]
    Encode(String),
}

/// Select a scaling filter based on how far we are downscaling. Heavy
/// reductions favor cheaper filters; near-1:1 scaling favors quality.
fn select_filter(orig_width: u32, orig_height: u32, new_width: u32, new_height: u32) -> image::imageops::FilterType {
    let width_ratio = orig_width as f32 / new_width as f32;
    let height_ratio = orig_height as f32 / new_height as f32;
    let max_ratio = width_ratio.max(height_ratio);

    if max_ratio > 2.0 {
        image::imageops::FilterType::Triangle
    } else if max_ratio > 1.5 {
        image::imageops::FilterType::CatmullRom
    } else {
        image::imageops::FilterType::Lanczos3
    }
}

/// Target height for a width-constrained scale, preserving aspect ratio.
fn height_for_width(orig_width: u32, orig_height: u32, width: u32) -> u32 {
    let aspect_ratio = orig_height as f32 / orig_width as f32;
    ((width as f32 * aspect_ratio).round() as u32).max(1)
}

fn scale_to_width(img: &DynamicImage, width: u32) -> DynamicImage {
    let (orig_width, orig_height) = img.dimensions();
    let height = height_for_width(orig_width, orig_height, width);
    let filter = select_filter(orig_width, orig_height, width, height);
    img.resize_exact(width, height, filter)
}

fn encode(img: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, ThumbnailError> {
    let mut out = Cursor::new(Vec::new());
    // Some formats (e.g. JPEG) reject alpha channels; flatten first.
    let img = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()),
        _ => img.clone(),
    };
    img.write_to(&mut out, format)
        .map_err(|e| ThumbnailError::Encode(e.to_string()))?;
    Ok(out.into_inner())
}

/// Render the full derivative set, one entry per target width in
/// [`THUMBNAIL_WIDTHS`] order. The image is decoded once and scaled per width;
/// any failure aborts the whole set.
pub fn render_thumbnail_set(data: &[u8]) -> Result<Vec<(u32, Vec<u8>)>, ThumbnailError> {
    let format = image::guess_format(data).map_err(|_| ThumbnailError::UnknownFormat)?;
    let img = image::load_from_memory_with_format(data, format)?;

    let mut set = Vec::with_capacity(THUMBNAIL_WIDTHS.len());
    for width in THUMBNAIL_WIDTHS {
        let scaled = scale_to_width(&img, width);
        set.push((width, encode(&scaled, format)?));
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([255, 0, 0, 255]),
        ));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_height_for_width_preserves_aspect() {
        assert_eq!(height_for_width(200, 100, 100), 50);
        assert_eq!(height_for_width(100, 200, 50), 100);
        // never collapses to zero
        assert_eq!(height_for_width(1000, 1, 100), 1);
    }

    #[test]
    fn test_select_filter_by_ratio() {
        assert_eq!(
            select_filter(1000, 1000, 100, 100),
            image::imageops::FilterType::Triangle
        );
        assert_eq!(
            select_filter(180, 180, 100, 100),
            image::imageops::FilterType::CatmullRom
        );
        assert_eq!(
            select_filter(110, 110, 100, 100),
            image::imageops::FilterType::Lanczos3
        );
    }

    #[test]
    fn test_render_preserves_aspect_ratio() {
        let data = png_bytes(400, 200);
        let set = render_thumbnail_set(&data).unwrap();
        let (_, thumb) = set.iter().find(|(w, _)| *w == 100).unwrap();
        let decoded = image::load_from_memory(thumb).unwrap();
        assert_eq!(decoded.dimensions(), (100, 50));
    }

    #[test]
    fn test_render_thumbnail_set_all_widths() {
        let data = png_bytes(1000, 1000);
        let set = render_thumbnail_set(&data).unwrap();
        let widths: Vec<u32> = set.iter().map(|(w, _)| *w).collect();
        assert_eq!(widths, vec![500, 250, 100]);
        for (width, bytes) in set {
            let decoded = image::load_from_memory(&bytes).unwrap();
            assert_eq!(decoded.width(), width);
            assert_eq!(decoded.height(), width); // square source
        }
    }

    #[test]
    fn test_render_preserves_source_format() {
        let data = png_bytes(300, 300);
        for (_, thumb) in render_thumbnail_set(&data).unwrap() {
            assert_eq!(image::guess_format(&thumb).unwrap(), ImageFormat::Png);
        }
    }

    #[test]
    fn test_render_rejects_non_image_bytes() {
        let err = render_thumbnail_set(b"definitely not an image").unwrap_err();
        assert!(matches!(err, ThumbnailError::UnknownFormat));
    }
}
