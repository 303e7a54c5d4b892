//! Image preprocessing for the SigLIP vision encoder.
//!
//! - Input size: `image_size`×`image_size` (224 or 384)
//! - Normalization: (pixel/255 - 0.5) / 0.5, i.e. [-1, 1]
//! - Channel order: RGB
//! - Tensor layout: NCHW [batch, channels, height, width]

use image::DynamicImage;
use ndarray::Array4;

/// Number of color channels (RGB).
const CHANNELS: usize = 3;

const NORM_MEAN: f32 = 0.5;
const NORM_STD: f32 = 0.5;

/// Resize, convert to RGB, normalize, and lay out as a `[1, 3, S, S]` tensor.
pub fn preprocess(image: &DynamicImage, image_size: u32) -> Array4<f32> {
    let resized = image.resize_exact(
        image_size,
        image_size,
        image::imageops::FilterType::Lanczos3,
    );
    let rgb = resized.to_rgb8();

    let size = image_size as usize;
    Array4::from_shape_fn((1, CHANNELS, size, size), |(_, c, y, x)| {
        let pixel = rgb.get_pixel(x as u32, y as u32);
        (pixel[c] as f32 / 255.0 - NORM_MEAN) / NORM_STD
    })
}
