//! Alpha-bbox trimming.
//!
//! Transparent padding around a sprite is only removed when doing so is
//! worth it: a one-pixel fringe produces a near no-op crop that still throws
//! away marginal content, so [`is_meaningful`] gates [`crop_to_bbox`].

use super::params::TrimParams;
use crate::types::BoundingBox;
use image::{RgbaImage, imageops};

/// Tight bounding box of pixels with alpha strictly above `alpha_threshold`.
///
/// Returns `None` when no pixel qualifies.
pub fn bbox_from_alpha(img: &RgbaImage, alpha_threshold: u8) -> Option<BoundingBox> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, p) in img.enumerate_pixels() {
        if p[3] > alpha_threshold {
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }
    }
    bounds.map(|(x0, y0, x1, y1)| BoundingBox::new(x0, y0, x1, y1))
}

/// Whether cropping `img_size` down to `bbox` removes enough to be worth it.
///
/// True when the trim removes at least `min_trim_ratio` of the area, or when
/// either side shrinks below `min_side_ratio` of the original.
pub fn is_meaningful(img_size: (u32, u32), bbox: &BoundingBox, params: &TrimParams) -> bool {
    let (w, h) = img_size;
    if w == 0 || h == 0 {
        return false;
    }
    let trim_ratio = 1.0 - bbox.area() as f64 / (w as f64 * h as f64);
    let width_ratio = bbox.width() as f64 / w as f64;
    let height_ratio = bbox.height() as f64 / h as f64;

    trim_ratio >= params.min_trim_ratio
        || width_ratio < params.min_side_ratio
        || height_ratio < params.min_side_ratio
}

/// Crop to `bbox` grown by `margin` on every side, clamped to the image.
pub fn crop_to_bbox(img: &RgbaImage, bbox: &BoundingBox, margin: u32) -> RgbaImage {
    let (w, h) = img.dimensions();
    let x0 = bbox.x0.saturating_sub(margin);
    let y0 = bbox.y0.saturating_sub(margin);
    let x1 = bbox.x1.saturating_add(margin).min(w.saturating_sub(1));
    let y1 = bbox.y1.saturating_add(margin).min(h.saturating_sub(1));
    imageops::crop_imm(img, x0, y0, x1 - x0 + 1, y1 - y0 + 1).to_image()
}

/// Outcome of the trim stage, recorded in the processing metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimDecision {
    /// The alpha bbox when trimmed, else the full original frame.
    pub bbox: BoundingBox,
    pub trimmed: bool,
}

/// Trim `img` if its alpha bbox is meaningful; otherwise return it unchanged.
pub fn trim_if_meaningful(img: RgbaImage, params: &TrimParams) -> (RgbaImage, TrimDecision) {
    let (w, h) = img.dimensions();
    match bbox_from_alpha(&img, params.alpha_threshold) {
        Some(bbox) if is_meaningful((w, h), &bbox, params) => {
            let cropped = crop_to_bbox(&img, &bbox, params.margin);
            log::debug!(
                "trimmed {w}x{h} to {}x{} (bbox {}x{})",
                cropped.width(),
                cropped.height(),
                bbox.width(),
                bbox.height()
            );
            (cropped, TrimDecision { bbox, trimmed: true })
        }
        _ => (
            img,
            TrimDecision {
                bbox: BoundingBox::full(w, h),
                trimmed: false,
            },
        ),
    }
}
