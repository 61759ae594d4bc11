//! Unsharp-mask sharpening and the per-channel blur it is built on.
//!
//! Channels are blurred as `f32` planes and rounded on the way back, so a
//! flat 255 region stays 255 instead of truncating to 254.

use super::params::Sharpening;
use image::{ImageBuffer, Luma, RgbaImage};
use imageproc::filter::gaussian_blur_f32;

pub(crate) type Plane = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Extract one channel of `img` as an `f32` plane.
pub(crate) fn channel_plane(img: &RgbaImage, channel: usize) -> Plane {
    ImageBuffer::from_fn(img.width(), img.height(), |x, y| {
        Luma([img.get_pixel(x, y)[channel] as f32])
    })
}

/// Gaussian-blurred copy of one channel. `sigma <= 0` returns the plane as is.
pub(crate) fn blurred_plane(img: &RgbaImage, channel: usize, sigma: f32) -> Plane {
    let plane = channel_plane(img, channel);
    if sigma <= 0.0 || img.width() == 0 || img.height() == 0 {
        return plane;
    }
    gaussian_blur_f32(&plane, sigma)
}

pub(crate) fn to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// `clip(original + amount * (original - blurred))` per channel.
///
/// With `rgb_only` the alpha channel is copied through unchanged.
pub fn unsharp_mask(img: RgbaImage, sharpening: &Sharpening) -> RgbaImage {
    if sharpening.radius <= 0.0 || sharpening.amount == 0.0 {
        return img;
    }
    let channels: &[usize] = if sharpening.rgb_only {
        &[0, 1, 2]
    } else {
        &[0, 1, 2, 3]
    };
    let blurred: Vec<(usize, Plane)> = channels
        .iter()
        .map(|&c| (c, blurred_plane(&img, c, sharpening.radius)))
        .collect();

    let mut out = img;
    for (c, plane) in &blurred {
        for (x, y, px) in out.enumerate_pixels_mut() {
            let original = px[*c] as f32;
            let b = plane.get_pixel(x, y)[0];
            px[*c] = to_u8(original + sharpening.amount * (original - b));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use image::Rgba;

    #[test]
    fn flat_image_is_unchanged() {
        let img = solid(16, 16, RED);
        assert_eq!(unsharp_mask(img.clone(), &Sharpening::pixel_art()), img);
    }

    #[test]
    fn opaque_white_stays_white() {
        let img = solid(8, 8, Rgba([255, 255, 255, 255]));
        let out = unsharp_mask(img, &Sharpening::pixel_art());
        assert!(out.pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn edges_gain_contrast() {
        // Left half dark, right half light
        let img = RgbaImage::from_fn(16, 16, |x, _| {
            if x < 8 {
                Rgba([60, 60, 60, 255])
            } else {
                Rgba([180, 180, 180, 255])
            }
        });
        let out = unsharp_mask(img, &Sharpening::pixel_art());
        assert!(out.get_pixel(7, 8)[0] < 60);
        assert!(out.get_pixel(8, 8)[0] > 180);
        // Far from the edge nothing moves
        assert_eq!(out.get_pixel(0, 8)[0], 60);
    }

    #[test]
    fn rgb_only_keeps_alpha() {
        let img = padded_sprite(8, 8, 4, RED);
        let out = unsharp_mask(img.clone(), &Sharpening::illustration());
        for (a, b) in img.pixels().zip(out.pixels()) {
            assert_eq!(a[3], b[3]);
        }
    }

    #[test]
    fn full_channel_keeps_binary_alpha_binary() {
        // Overshoot clips back to 0 and 255
        let out = unsharp_mask(padded_sprite(8, 8, 4, RED), &Sharpening::pixel_art());
        assert!(out.pixels().all(|p| p[3] == 0 || p[3] == 255));
        assert_eq!(count_alpha(&out, 255), 64);
    }

    #[test]
    fn zero_amount_is_identity() {
        let img = gradient(10, 10);
        let s = Sharpening {
            amount: 0.0,
            ..Sharpening::pixel_art()
        };
        assert_eq!(unsharp_mask(img.clone(), &s), img);
    }
}
