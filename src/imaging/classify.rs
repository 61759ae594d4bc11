//! Kind detection: pixel art vs illustration.
//!
//! Pixel art has a small palette and hard edges everywhere. Both statistics
//! are measured on an area-averaged sample of at most
//! [`ClassifierParams::sample_size`] pixels per side:
//!
//! - **Colour count**: distinct RGB triples in the sample (alpha ignored).
//! - **Edge ratio**: fraction of sample pixels Canny marks as edges.
//!
//! An image is pixel art iff `colors < max_colors && edge_ratio > min_edge_ratio`.

use super::params::ClassifierParams;
use crate::types::Kind;
use image::{RgbaImage, imageops};
use imageproc::edges::canny;
use std::collections::HashSet;

/// Raw statistics behind a classification, exposed for the `classify`
/// subcommand and for tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KindStats {
    pub unique_colors: usize,
    pub edge_ratio: f32,
}

impl KindStats {
    pub fn kind(&self, params: &ClassifierParams) -> Kind {
        if self.unique_colors < params.max_colors && self.edge_ratio > params.min_edge_ratio {
            Kind::PixelArt
        } else {
            Kind::Illustration
        }
    }
}

/// Measure colour count and edge density on a downscaled sample.
pub fn measure(img: &RgbaImage, params: &ClassifierParams) -> KindStats {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return KindStats {
            unique_colors: 0,
            edge_ratio: 0.0,
        };
    }

    let (sw, sh) = (w.min(params.sample_size), h.min(params.sample_size));
    let sample = if (sw, sh) == (w, h) {
        img.clone()
    } else {
        imageops::thumbnail(img, sw, sh)
    };

    let unique_colors = sample
        .pixels()
        .map(|p| [p[0], p[1], p[2]])
        .collect::<HashSet<_>>()
        .len();

    // Canny needs a 3x3 neighbourhood to say anything meaningful
    let edge_ratio = if sw < 3 || sh < 3 {
        0.0
    } else {
        let gray = imageops::grayscale(&sample);
        let edges = canny(&gray, params.canny_low, params.canny_high);
        let edge_pixels = edges.pixels().filter(|p| p[0] > 0).count();
        edge_pixels as f32 / (sw as f32 * sh as f32)
    };

    KindStats {
        unique_colors,
        edge_ratio,
    }
}

/// Classify `img` as [`Kind::PixelArt`] or [`Kind::Illustration`].
pub fn classify_kind(img: &RgbaImage, params: &ClassifierParams) -> Kind {
    let stats = measure(img, params);
    let kind = stats.kind(params);
    log::debug!(
        "classified as {kind}: {} colors, edge ratio {:.3}",
        stats.unique_colors,
        stats.edge_ratio
    );
    kind
}
