//! Fitting content into the output box.
//!
//! Padding is the default: content is downscaled (never upscaled) until it
//! fits, then centred on a transparent canvas. Cropping only happens when
//! [`FitOptions::allow_crop`] is set *and* the image covers the box on both
//! axes.
//!
//! [`pad_to_size`] requires the content to already fit. It reports
//! [`ImagingError::InvariantViolation`] instead of clamping, since an
//! oversized input means the scale/fit sequencing upstream is wrong.

use super::backend::ImagingError;
use super::calculations::{
    calculate_fill_dimensions, calculate_fit_box_dimensions, centered_offset,
};
use super::inpaint::inpaint;
use super::params::InpaintMethod;
use super::saliency::{SaliencySource, bbox_from_saliency};
use super::scale::{fit_long_to, resize_to_box};
use image::{RgbaImage, imageops};

/// Knobs shared by [`smart_square`] and [`fit_to_size`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FitOptions {
    /// Fill and crop instead of fit and pad when the image covers the box.
    pub allow_crop: bool,
    /// Centre crops on the saliency box instead of the image centre.
    pub use_saliency: bool,
    /// Fill the padded border instead of leaving it transparent.
    pub inpaint: InpaintMethod,
}

/// Centre `img` on a transparent `side`×`side` canvas.
pub fn pad_to_square(
    img: RgbaImage,
    side: u32,
    method: InpaintMethod,
) -> Result<RgbaImage, ImagingError> {
    pad_to_size(img, side, side, method)
}

/// Centre `img` on a transparent `width`×`height` canvas.
///
/// # Errors
/// [`ImagingError::InvariantViolation`] if `img` is larger than the canvas on
/// either axis.
pub fn pad_to_size(
    img: RgbaImage,
    width: u32,
    height: u32,
    method: InpaintMethod,
) -> Result<RgbaImage, ImagingError> {
    let (w, h) = img.dimensions();
    if w > width || h > height {
        return Err(ImagingError::InvariantViolation(format!(
            "cannot pad {w}x{h} into {width}x{height}: content must be downscaled first"
        )));
    }
    if (w, h) == (width, height) {
        return Ok(img);
    }

    let (x, y) = centered_offset((width, height), (w, h));
    let mut canvas = RgbaImage::new(width, height);
    imageops::replace(&mut canvas, &img, x as i64, y as i64);
    Ok(inpaint(canvas, method))
}

/// Make `img` exactly `side`×`side`.
///
/// Downscales the long side to `side` when needed, then pads. With
/// `allow_crop` and an image at least `side` on both axes, fills and crops
/// instead.
pub fn smart_square(
    img: RgbaImage,
    side: u32,
    options: &FitOptions,
) -> Result<RgbaImage, ImagingError> {
    if img.dimensions() == (side, side) {
        return Ok(img);
    }
    if options.allow_crop && img.width() >= side && img.height() >= side {
        return Ok(fill_and_crop(&img, side, side, options.use_saliency));
    }
    let fitted = fit_long_to(img, side);
    pad_to_square(fitted, side, options.inpaint)
}

/// Make `img` exactly `width`×`height`, preserving aspect ratio.
///
/// Generalises [`smart_square`] to rectangular boxes: the constrained axis is
/// picked by comparing aspect ratios, then the result is padded (or, with
/// `allow_crop`, filled and cropped).
pub fn fit_to_size(
    img: RgbaImage,
    width: u32,
    height: u32,
    options: &FitOptions,
) -> Result<RgbaImage, ImagingError> {
    let (w, h) = img.dimensions();
    if (w, h) == (width, height) {
        return Ok(img);
    }
    if options.allow_crop && w >= width && h >= height {
        return Ok(fill_and_crop(&img, width, height, options.use_saliency));
    }

    let (fit_w, fit_h) = calculate_fit_box_dimensions((w, h), (width, height));
    let fitted = if (fit_w, fit_h) == (w, h) {
        img
    } else {
        resize_to_box(&img, fit_w, fit_h)
    };
    pad_to_size(fitted, width, height, options.inpaint)
}

/// Downscale so the box is covered, then crop a `width`×`height` window
/// centred on the image or on its saliency box.
fn fill_and_crop(img: &RgbaImage, width: u32, height: u32, use_saliency: bool) -> RgbaImage {
    let (fill_w, fill_h) = calculate_fill_dimensions(img.dimensions(), (width, height));
    let filled = resize_to_box(img, fill_w, fill_h);

    let (cx, cy) = if use_saliency {
        let found = bbox_from_saliency(&filled);
        match found.source {
            SaliencySource::Estimated => {
                log::debug!("crop centred on saliency box {:?}", found.bbox)
            }
            SaliencySource::FullImage => {
                log::warn!("no salient region found, cropping the centre")
            }
        }
        (
            (found.bbox.x0 + found.bbox.x1) / 2,
            (found.bbox.y0 + found.bbox.y1) / 2,
        )
    } else {
        (fill_w / 2, fill_h / 2)
    };

    let x0 = cx.saturating_sub(width / 2).min(fill_w - width);
    let y0 = cy.saturating_sub(height / 2).min(fill_h - height);
    imageops::crop_imm(&filled, x0, y0, width, height).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use image::Rgba;

    fn crop() -> FitOptions {
        FitOptions {
            allow_crop: true,
            ..FitOptions::default()
        }
    }

    // =========================================================================
    // pad_to_square / pad_to_size tests
    // =========================================================================

    #[test]
    fn pad_centres_content_unchanged() {
        let img = gradient(10, 6);
        let out = pad_to_square(img.clone(), 16, InpaintMethod::None).unwrap();
        assert_eq!(out.dimensions(), (16, 16));
        for (x, y, p) in img.enumerate_pixels() {
            assert_eq!(out.get_pixel(x + 3, y + 5), p);
        }
        assert_eq!(out.get_pixel(0, 0)[3], 0);
        assert_eq!(count_alpha(&out, 255), 60);
    }

    #[test]
    fn pad_rejects_oversized_content() {
        let err = pad_to_square(solid(17, 4, RED), 16, InpaintMethod::None).unwrap_err();
        assert!(matches!(err, ImagingError::InvariantViolation(_)));

        let err = pad_to_size(solid(4, 9, RED), 16, 8, InpaintMethod::None).unwrap_err();
        assert!(matches!(err, ImagingError::InvariantViolation(_)));
    }

    #[test]
    fn pad_exact_size_is_identity() {
        let img = gradient(12, 12);
        assert_eq!(pad_to_square(img.clone(), 12, InpaintMethod::Telea).unwrap(), img);
    }

    #[test]
    fn pad_with_inpaint_is_opaque() {
        let out = pad_to_size(solid(4, 4, RED), 10, 6, InpaintMethod::Telea).unwrap();
        assert_eq!(count_alpha(&out, 255), 60);
    }

    #[test]
    fn pad_to_size_offsets() {
        let out = pad_to_size(solid(3, 2, BLUE), 8, 5, InpaintMethod::None).unwrap();
        // offsets (2, 1)
        assert_eq!(opaque_bounds(&out), Some((2, 1, 4, 2)));
    }

    // =========================================================================
    // smart_square tests
    // =========================================================================

    #[test]
    fn smart_square_pads_small_images() {
        let out = smart_square(solid(20, 10, RED), 64, &FitOptions::default()).unwrap();
        assert_eq!(out.dimensions(), (64, 64));
        assert_eq!(opaque_bounds(&out), Some((22, 27, 41, 36)));
    }

    #[test]
    fn smart_square_downscales_then_pads() {
        let out = smart_square(gradient(400, 100), 100, &FitOptions::default()).unwrap();
        assert_eq!(out.dimensions(), (100, 100));
        assert_eq!(out.get_pixel(50, 0)[3], 0);
        assert_eq!(out.get_pixel(50, 50)[3], 255);
    }

    #[test]
    fn smart_square_near_square_large_image() {
        let out = smart_square(solid(210, 200, RED), 100, &FitOptions::default()).unwrap();
        assert_eq!(out.dimensions(), (100, 100));
        assert_eq!(out.get_pixel(50, 50), &RED);
    }

    #[test]
    fn smart_square_crop_mode_fills_box() {
        let out = smart_square(gradient(400, 200), 100, &crop()).unwrap();
        assert_eq!(out.dimensions(), (100, 100));
        assert!(out.pixels().all(|p| p[3] == 255));
    }

    #[test]
    fn smart_square_crop_mode_pads_when_too_small() {
        let out = smart_square(solid(300, 50, RED), 100, &crop()).unwrap();
        assert_eq!(out.dimensions(), (100, 100));
        assert_eq!(out.get_pixel(50, 0)[3], 0);
    }

    #[test]
    fn smart_square_saliency_crop_has_exact_size() {
        let options = FitOptions {
            use_saliency: true,
            ..crop()
        };
        let img = RgbaImage::from_fn(300, 150, |x, y| {
            if (200..240).contains(&x) && (50..90).contains(&y) {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([20, 20, 20, 255])
            }
        });
        let out = smart_square(img, 100, &options).unwrap();
        assert_eq!(out.dimensions(), (100, 100));
    }

    // =========================================================================
    // fit_to_size tests
    // =========================================================================

    #[test]
    fn fit_to_size_always_exact_without_crop() {
        let sources = [(10, 10), (500, 20), (20, 500), (640, 480), (127, 129), (1, 1)];
        let targets = [(64, 64), (128, 64), (64, 128), (300, 7)];
        for (sw, sh) in sources {
            for (tw, th) in targets {
                let out = fit_to_size(solid(sw, sh, RED), tw, th, &FitOptions::default()).unwrap();
                assert_eq!(out.dimensions(), (tw, th), "{sw}x{sh} into {tw}x{th}");
            }
        }
    }

    #[test]
    fn fit_to_size_crop_mode_exact() {
        let out = fit_to_size(gradient(500, 400), 200, 100, &crop()).unwrap();
        assert_eq!(out.dimensions(), (200, 100));
        assert!(out.pixels().all(|p| p[3] == 255));
    }

    #[test]
    fn fit_to_size_never_upscales() {
        let out = fit_to_size(solid(10, 5, RED), 100, 100, &FitOptions::default()).unwrap();
        assert_eq!(count_alpha(&out, 255), 50);
    }
}
