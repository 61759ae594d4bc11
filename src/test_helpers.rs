//! Shared test utilities for the asset-normalizer test suite.
//!
//! Synthetic image builders (solid fills, padded sprites, checkerboards,
//! gradients) plus helpers for writing them to disk and asserting on alpha
//! coverage.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let sprite = padded_sprite(20, 10, 6, RED);
//! assert_eq!(sprite.dimensions(), (32, 22));
//! assert_eq!(opaque_bounds(&sprite), Some((6, 6, 25, 15)));
//! ```

use image::{Rgba, RgbaImage};
use std::path::{Path, PathBuf};

use crate::imaging::codec::save_asset;
use crate::types::Asset;

pub const RED: Rgba<u8> = Rgba([220, 30, 30, 255]);
pub const BLUE: Rgba<u8> = Rgba([20, 40, 200, 255]);
pub const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

// =========================================================================
// Image builders
// =========================================================================

/// A `width`×`height` image filled with `color`.
pub fn solid(width: u32, height: u32, color: Rgba<u8>) -> RgbaImage {
    RgbaImage::from_pixel(width, height, color)
}

/// A `content_w`×`content_h` block of `color` surrounded by `border`
/// transparent pixels on every side.
pub fn padded_sprite(content_w: u32, content_h: u32, border: u32, color: Rgba<u8>) -> RgbaImage {
    let (w, h) = (content_w + 2 * border, content_h + 2 * border);
    RgbaImage::from_fn(w, h, |x, y| {
        let inside = (border..border + content_w).contains(&x)
            && (border..border + content_h).contains(&y);
        if inside { color } else { CLEAR }
    })
}

/// Two-colour checkerboard with square cells of `cell` pixels.
pub fn checkerboard(width: u32, height: u32, cell: u32, a: Rgba<u8>, b: Rgba<u8>) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        if ((x / cell) + (y / cell)) % 2 == 0 { a } else { b }
    })
}

/// Smooth opaque gradient with far more than 80 distinct colours.
pub fn gradient(width: u32, height: u32) -> RgbaImage {
    let (wd, hd) = (width.saturating_sub(1).max(1), height.saturating_sub(1).max(1));
    RgbaImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / wd).min(255) as u8;
        let g = (y * 255 / hd).min(255) as u8;
        let b = ((x + y) % 256) as u8;
        Rgba([r, g, b, 255])
    })
}

// =========================================================================
// Inspection
// =========================================================================

/// Tight `(x0, y0, x1, y1)` bounds of pixels with alpha 255, if any.
pub fn opaque_bounds(img: &RgbaImage) -> Option<(u32, u32, u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, p) in img.enumerate_pixels() {
        if p[3] == 255 {
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }
    }
    bounds
}

/// Number of pixels whose alpha is exactly `alpha`.
pub fn count_alpha(img: &RgbaImage, alpha: u8) -> usize {
    img.pixels().filter(|p| p[3] == alpha).count()
}

// =========================================================================
// Filesystem
// =========================================================================

/// Save `img` as a PNG under `dir`, returning the full path.
pub fn write_png(dir: &Path, name: &str, img: &RgbaImage) -> PathBuf {
    write_png_with_icc(dir, name, img, None)
}

/// Save `img` as a PNG with an optional embedded ICC profile.
pub fn write_png_with_icc(
    dir: &Path,
    name: &str,
    img: &RgbaImage,
    icc: Option<Vec<u8>>,
) -> PathBuf {
    let path = dir.join(name);
    let asset = Asset::new(img.clone()).with_icc_profile(icc);
    save_asset(&asset, &path).unwrap();
    path
}
