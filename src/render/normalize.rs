//! Output bounds shared by every engine.

use super::sandbox::SandboxError;
use crate::config::SandboxConfig;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

/// Pixel bounds for embedded figures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageBounds {
    /// Longest side, in pixels
    pub max_dimension: u32,
    /// Longest side over shortest side
    pub max_aspect_ratio: f32,
}

impl ImageBounds {
    pub fn from_config(config: &SandboxConfig) -> Self {
        Self {
            max_dimension: config.max_image_dimension,
            max_aspect_ratio: config.max_aspect_ratio,
        }
    }
}

impl Default for ImageBounds {
    fn default() -> Self {
        Self::from_config(&SandboxConfig::default())
    }
}

/// Decode, flatten onto white, downscale, pad to the aspect bound and re-encode as PNG.
pub fn normalize_image(bytes: &[u8], bounds: ImageBounds) -> Result<Vec<u8>, SandboxError> {
    let decoded =
        image::load_from_memory(bytes).map_err(|e| SandboxError::InvalidImage(e.to_string()))?;
    if decoded.width() == 0 || decoded.height() == 0 {
        return Err(SandboxError::InvalidImage("image has no pixels".to_string()));
    }

    let mut image = DynamicImage::ImageRgba8(flatten_on_white(&decoded.to_rgba8()));

    let max_dim = bounds.max_dimension.max(1);
    if image.width() > max_dim || image.height() > max_dim {
        image = image.resize(max_dim, max_dim, FilterType::Triangle);
    }

    let image = pad_to_aspect(image.to_rgba8(), bounds.max_aspect_ratio);

    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(image)
        .to_rgb8()
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| SandboxError::InvalidImage(e.to_string()))?;
    Ok(out.into_inner())
}

fn flatten_on_white(rgba: &RgbaImage) -> RgbaImage {
    let mut flattened = RgbaImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = u16::from(pixel[3]);
        let blend =
            |channel: u8| -> u8 { (((u16::from(channel) * alpha) + (255 * (255 - alpha))) / 255) as u8 };
        flattened.put_pixel(
            x,
            y,
            Rgba([blend(pixel[0]), blend(pixel[1]), blend(pixel[2]), 255]),
        );
    }
    flattened
}

/// Center `image` on a white canvas whose short side is long enough to
/// bring the aspect ratio within `max_ratio`.
fn pad_to_aspect(image: RgbaImage, max_ratio: f32) -> RgbaImage {
    let (width, height) = image.dimensions();
    let long = width.max(height);
    let short = width.min(height);
    let max_ratio = max_ratio.max(1.0);

    if (long as f32) <= (short as f32) * max_ratio {
        return image;
    }

    let padded_short = ((long as f32) / max_ratio).ceil() as u32;
    let (canvas_w, canvas_h) = if width >= height {
        (width, padded_short)
    } else {
        (padded_short, height)
    };

    let mut canvas = RgbaImage::from_pixel(canvas_w, canvas_h, Rgba([255, 255, 255, 255]));
    let x = i64::from((canvas_w - width) / 2);
    let y = i64::from((canvas_h - height) / 2);
    image::imageops::overlay(&mut canvas, &image, x, y);
    canvas
}
