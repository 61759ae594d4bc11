//! Scaling strategies.
//!
//! Pixel art is only ever scaled by whole factors with nearest-neighbour
//! sampling so every source pixel becomes a crisp `n×n` block. Everything
//! else uses Lanczos3, and [`fit_long_to`] never upscales.

use super::calculations::{calculate_fit_long_dimensions, choose_integer_scale_for_box};
use image::RgbaImage;
use image::imageops::{self, FilterType};

/// Multiply both dimensions by `factor` with nearest-neighbour sampling.
pub fn resize_nearest(img: RgbaImage, factor: u32) -> RgbaImage {
    if factor <= 1 {
        return img;
    }
    imageops::resize(
        &img,
        img.width() * factor,
        img.height() * factor,
        FilterType::Nearest,
    )
}

/// Integer nearest-neighbour upscale to the largest factor fitting `target`.
pub fn scale_pixel_art(img: RgbaImage, target: (u32, u32)) -> RgbaImage {
    let factor = choose_integer_scale_for_box(img.dimensions(), target);
    log::debug!(
        "pixel art {}x{} scaled by {factor}",
        img.width(),
        img.height()
    );
    resize_nearest(img, factor)
}

/// Scale down so the long side equals `target_long`. No-op when the image
/// already fits.
pub fn fit_long_to(img: RgbaImage, target_long: u32) -> RgbaImage {
    let (w, h) = calculate_fit_long_dimensions(img.dimensions(), target_long);
    if (w, h) == img.dimensions() {
        return img;
    }
    resize_to_box(&img, w, h)
}

/// Resize to exactly `width`×`height` with Lanczos3. May change aspect ratio.
pub fn resize_to_box(img: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if img.dimensions() == (width, height) {
        return img.clone();
    }
    imageops::resize(img, width, height, FilterType::Lanczos3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    #[test]
    fn nearest_scale_replicates_pixels() {
        let img = checkerboard(3, 2, 1, RED, BLUE);
        let out = resize_nearest(img.clone(), 4);
        assert_eq!(out.dimensions(), (12, 8));
        for (x, y, p) in out.enumerate_pixels() {
            assert_eq!(p, img.get_pixel(x / 4, y / 4), "at {x},{y}");
        }
    }

    #[test]
    fn nearest_scale_by_one_is_identity() {
        let img = gradient(5, 7);
        assert_eq!(resize_nearest(img.clone(), 1), img);
    }

    #[test]
    fn pixel_art_uses_integer_factor() {
        let out = scale_pixel_art(solid(37, 52, RED), (256, 256));
        assert_eq!(out.dimensions(), (148, 208));
    }

    #[test]
    fn pixel_art_respects_box_axes() {
        let out = scale_pixel_art(solid(16, 16, RED), (128, 64));
        assert_eq!(out.dimensions(), (64, 64));
    }

    #[test]
    fn fit_long_downscales_landscape() {
        let out = fit_long_to(gradient(400, 100), 200);
        assert_eq!(out.dimensions(), (200, 50));
    }

    #[test]
    fn fit_long_never_upscales() {
        let img = gradient(40, 10);
        assert_eq!(fit_long_to(img.clone(), 200), img);
    }

    #[test]
    fn resize_to_box_exact_dimensions() {
        let out = resize_to_box(&gradient(30, 30), 17, 41);
        assert_eq!(out.dimensions(), (17, 41));
    }
}
