//! Alpha-channel repair.
//!
//! | Operation | Used for | Effect |
//! |---|---|---|
//! | [`unpremultiply`] | both kinds | divides RGB by alpha |
//! | [`defringe`] | pixel art | grayscale dilation of alpha, hardens edges |
//! | [`smooth_edges`] | illustrations, after scaling | Gaussian blur of alpha only |
//!
//! Defringing is never applied to illustrations: dilating a soft edge turns
//! it into a jagged contour.

use super::enhance::{blurred_plane, to_u8};
use image::{GrayImage, RgbaImage};
use imageproc::morphology::{Mask, grayscale_dilate};

/// Reverse premultiplied alpha: `rgb = clamp(rgb / (a / 255))`.
///
/// Pixels with alpha 0 are left untouched; alpha 255 is the identity.
pub fn unpremultiply(mut img: RgbaImage) -> RgbaImage {
    for px in img.pixels_mut() {
        let a = px[3] as f32 / 255.0;
        if a <= 1e-5 || px[3] == 255 {
            continue;
        }
        for c in 0..3 {
            px[c] = (px[c] as f32 / a).clamp(0.0, 255.0) as u8;
        }
    }
    img
}

/// Dilate the alpha channel with a `(2r+1)`-square kernel. RGB is untouched.
pub fn defringe(mut img: RgbaImage, radius: u32) -> RgbaImage {
    if radius == 0 || img.width() == 0 || img.height() == 0 {
        return img;
    }
    let alpha = GrayImage::from_fn(img.width(), img.height(), |x, y| {
        image::Luma([img.get_pixel(x, y)[3]])
    });
    let mask = Mask::square(radius.min(u8::MAX as u32) as u8);
    let dilated = grayscale_dilate(&alpha, &mask);
    for (x, y, px) in img.enumerate_pixels_mut() {
        px[3] = dilated.get_pixel(x, y)[0];
    }
    img
}

/// Gaussian-blur the alpha channel only, softening stair-stepped edges left
/// by resampling. `radius` is the blur sigma; `<= 0` is a no-op.
pub fn smooth_edges(mut img: RgbaImage, radius: f32) -> RgbaImage {
    if radius <= 0.0 {
        return img;
    }
    let blurred = blurred_plane(&img, 3, radius);
    for (x, y, px) in img.enumerate_pixels_mut() {
        px[3] = to_u8(blurred.get_pixel(x, y)[0]);
    }
    img
}
