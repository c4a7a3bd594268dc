//! Shared test utilities for image-based unit tests.

use image::{Rgb, RgbImage};

/// Uniformly colored RGB image.
pub(crate) fn solid_rgb(w: u32, h: u32, rgb: [u8; 3]) -> RgbImage {
    let mut img = RgbImage::new(w, h);
    for p in img.pixels_mut() {
        *p = Rgb(rgb);
    }
    img
}
