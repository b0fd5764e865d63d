// Photo loading: fetch, decode, downscale, flatten transparency.

use std::io::Read;

use ::image::{DynamicImage, Rgba, RgbImage};

use crate::canvas::RasterImage;
use crate::error::AssetError;

/// Phone photos are downscaled to fit this box before embedding.
pub const MAX_PHOTO_EDGE: u32 = 1200;

/// Decode photo bytes into RGB pixels ready for the PDF writer.
pub fn decode_photo(bytes: &[u8]) -> Result<RasterImage, AssetError> {
    if bytes.is_empty() {
        return Err(AssetError::Empty);
    }
    let img = ::image::load_from_memory(bytes).map_err(|e| AssetError::Decode(e.to_string()))?;
    let img = if img.width() > MAX_PHOTO_EDGE || img.height() > MAX_PHOTO_EDGE {
        img.thumbnail(MAX_PHOTO_EDGE, MAX_PHOTO_EDGE)
    } else {
        img
    };
    if img.width() == 0 || img.height() == 0 {
        return Err(AssetError::Decode("image has no pixels".to_string()));
    }
    Ok(flatten_on_white(&img, true))
}

/// Composite any alpha channel against white and pack as RGB8.
pub fn flatten_on_white(img: &DynamicImage, interpolate: bool) -> RasterImage {
    let rgba_image = img.to_rgba8();
    let (width, height) = rgba_image.dimensions();

    let mut rgb_image = RgbImage::new(width, height);
    for (x, y, pixel) in rgba_image.enumerate_pixels() {
        let Rgba([r, g, b, a]) = *pixel;
        let alpha = a as f32 / 255.0;
        let bg = 255.0;
        let out_r = (r as f32 * alpha + bg * (1.0 - alpha)) as u8;
        let out_g = (g as f32 * alpha + bg * (1.0 - alpha)) as u8;
        let out_b = (b as f32 * alpha + bg * (1.0 - alpha)) as u8;
        rgb_image.put_pixel(x, y, ::image::Rgb([out_r, out_g, out_b]));
    }

    RasterImage {
        width,
        height,
        pixels: rgb_image.into_raw(),
        interpolate,
    }
}

/// Largest size with the image's aspect ratio that fits inside `max_width` x `max_height`.
pub fn fit_within(aspect_ratio: f32, max_width: f32, max_height: f32) -> (f32, f32) {
    if aspect_ratio <= 0.0 || max_height <= 0.0 {
        return (max_width, max_height);
    }
    if max_width / max_height > aspect_ratio {
        // Height-constrained
        (max_height * aspect_ratio, max_height)
    } else {
        // Width-constrained
        (max_width, max_width / aspect_ratio)
    }
}

pub fn is_url(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

/// Download a photo over HTTP(S).
pub fn fetch_url(url: &str) -> Result<Vec<u8>, AssetError> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| AssetError::Fetch(format!("{}: {}", url, e)))?;

    let mut bytes = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut bytes)
        .map_err(|e| AssetError::Fetch(format!("failed to read response: {}", e)))?;
    Ok(bytes)
}
