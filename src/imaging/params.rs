//! Parameter types for image operations.
//!
//! These structs describe *how strongly* each stage acts, not *when* it runs.
//! The orchestrator in [`process`](crate::process) decides which stages run for
//! a given [`Kind`](crate::types::Kind); the values come from
//! [`PipelineConfig`](crate::config::PipelineConfig).
//!
//! ## Types
//!
//! - [`ClassifierParams`]: colour-count and edge-density thresholds for kind detection.
//! - [`TrimParams`]: alpha threshold, significance ratios and crop margin for trimming.
//! - [`Sharpening`]: unsharp-mask radius, amount and channel selection.
//! - [`InpaintMethod`]: optional border fill used when padding.

use crate::types::ValidationError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Thresholds for [`classify_kind`](super::classify::classify_kind).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierParams {
    /// Longest side of the sample the statistics are computed on.
    pub sample_size: u32,
    /// Pixel art must have strictly fewer unique colours than this.
    pub max_colors: usize,
    /// Pixel art must have a strictly higher Canny edge ratio than this.
    pub min_edge_ratio: f32,
    pub canny_low: f32,
    pub canny_high: f32,
}

impl Default for ClassifierParams {
    fn default() -> Self {
        Self {
            sample_size: 128,
            max_colors: 80,
            min_edge_ratio: 0.12,
            canny_low: 80.0,
            canny_high: 140.0,
        }
    }
}

/// Settings for alpha-bbox trimming.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimParams {
    /// Pixels with alpha strictly above this count as content.
    pub alpha_threshold: u8,
    /// Minimum fraction of the area a trim must remove.
    pub min_trim_ratio: f64,
    /// A trim is also meaningful when either side ratio falls below this.
    pub min_side_ratio: f64,
    /// Extra pixels kept around the bbox when cropping.
    pub margin: u32,
}

impl Default for TrimParams {
    fn default() -> Self {
        Self {
            alpha_threshold: 5,
            min_trim_ratio: 0.05,
            min_side_ratio: 0.95,
            margin: 2,
        }
    }
}

/// Unsharp-mask parameters.
///
/// - `radius`: Gaussian sigma of the blur the mask is built from
/// - `amount`: weight of `original - blurred` added back
/// - `rgb_only`: leave the alpha channel untouched
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sharpening {
    pub radius: f32,
    pub amount: f32,
    pub rgb_only: bool,
}

impl Sharpening {
    /// Full-channel sharpening for pixel art.
    pub fn pixel_art() -> Self {
        Self {
            radius: 1.0,
            amount: 0.2,
            rgb_only: false,
        }
    }

    /// Gentler colour-only sharpening for illustrations.
    pub fn illustration() -> Self {
        Self {
            radius: 1.0,
            amount: 0.1,
            rgb_only: true,
        }
    }
}

/// How the transparent border created by padding is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InpaintMethod {
    /// Leave the border transparent.
    #[default]
    None,
    /// Fast-marching style fill: nearest pixels first, distance weighted.
    Telea,
    /// Diffusion fill: onion-peel seed followed by Laplace smoothing.
    Ns,
}

impl FromStr for InpaintMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(InpaintMethod::None),
            "telea" => Ok(InpaintMethod::Telea),
            "ns" => Ok(InpaintMethod::Ns),
            other => Err(ValidationError::new(format!(
                "inpaint must be 'none', 'telea', or 'ns' (got '{other}')"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifier_defaults() {
        let p = ClassifierParams::default();
        assert_eq!(p.max_colors, 80);
        assert_eq!(p.min_edge_ratio, 0.12);
        assert_eq!((p.canny_low, p.canny_high), (80.0, 140.0));
    }

    #[test]
    fn trim_defaults() {
        let p = TrimParams::default();
        assert_eq!(p.alpha_threshold, 5);
        assert_eq!(p.margin, 2);
    }

    #[test]
    fn sharpening_profiles_differ() {
        assert!(!Sharpening::pixel_art().rgb_only);
        assert!(Sharpening::illustration().rgb_only);
        assert!(Sharpening::pixel_art().amount > Sharpening::illustration().amount);
    }

    #[test]
    fn inpaint_parses() {
        assert_eq!("telea".parse::<InpaintMethod>(), Ok(InpaintMethod::Telea));
        assert_eq!("ns".parse::<InpaintMethod>(), Ok(InpaintMethod::Ns));
        assert!("navier".parse::<InpaintMethod>().is_err());
    }
}
