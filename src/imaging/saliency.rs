//! Spectral-residual saliency: a rough "where is the subject" box used to
//! centre opt-in crops.
//!
//! The map follows Hou & Zhang's spectral residual method on a 64×64 grey
//! thumbnail: the log-amplitude spectrum minus its local mean is recombined
//! with the original phase and transformed back. The map is then thresholded
//! with Otsu's level and the largest outer contour's bounding rectangle wins.
//!
//! The estimator never fails outright. When nothing usable comes out (tiny or
//! flat images, no contour) the result is the full frame tagged
//! [`SaliencySource::FullImage`] so callers can tell a real detection from
//! the fallback.

use crate::types::BoundingBox;
use image::imageops::{self, FilterType};
use image::{GrayImage, ImageBuffer, Luma, RgbaImage};
use imageproc::contours::{BorderType, find_contours};
use imageproc::contrast::otsu_level;
use std::f64::consts::PI;

/// Long side of the working copy the saliency map is resized back to.
const WORKING_SIZE: u32 = 256;
/// Side of the square thumbnail the spectrum is computed on.
const SPECTRUM_SIZE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaliencySource {
    /// A salient region was found.
    Estimated,
    /// Nothing was found; the box covers the whole image.
    FullImage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaliencyBox {
    pub bbox: BoundingBox,
    pub source: SaliencySource,
}

impl SaliencyBox {
    fn full(width: u32, height: u32) -> Self {
        Self {
            bbox: BoundingBox::full(width, height),
            source: SaliencySource::FullImage,
        }
    }
}

/// Estimate the salient region of `img` in original pixel coordinates.
pub fn bbox_from_saliency(img: &RgbaImage) -> SaliencyBox {
    let (w, h) = img.dimensions();
    if w < 4 || h < 4 {
        return SaliencyBox::full(w, h);
    }

    let scale = (WORKING_SIZE as f64 / w.max(h) as f64).min(1.0);
    let sw = ((w as f64 * scale) as u32).max(1);
    let sh = ((h as f64 * scale) as u32).max(1);
    let small = if (sw, sh) == (w, h) {
        imageops::grayscale(img)
    } else {
        imageops::grayscale(&imageops::thumbnail(img, sw, sh))
    };

    let Some(map) = saliency_map(&small) else {
        log::debug!("saliency map is flat, using full frame");
        return SaliencyBox::full(w, h);
    };

    let level = otsu_level(&map);
    let binary = GrayImage::from_fn(sw, sh, |x, y| {
        Luma([if map.get_pixel(x, y)[0] > level { 255 } else { 0 }])
    });

    let largest = find_contours::<i32>(&binary)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter(|c| !c.points.is_empty())
        .map(|c| {
            let area = polygon_area(&c.points);
            (area, c.points)
        })
        .max_by(|a, b| a.0.total_cmp(&b.0));

    let Some((_, points)) = largest else {
        log::debug!("no salient contour found, using full frame");
        return SaliencyBox::full(w, h);
    };

    let min_x = points.iter().map(|p| p.x).min().unwrap_or(0).max(0) as f64;
    let min_y = points.iter().map(|p| p.y).min().unwrap_or(0).max(0) as f64;
    let max_x = points.iter().map(|p| p.x).max().unwrap_or(0).max(0) as f64 + 1.0;
    let max_y = points.iter().map(|p| p.y).max().unwrap_or(0).max(0) as f64 + 1.0;

    let (inv_x, inv_y) = (w as f64 / sw as f64, h as f64 / sh as f64);
    let margin = (0.01 * w.max(h) as f64) as u32;
    let x0 = ((min_x * inv_x) as u32).saturating_sub(margin);
    let y0 = ((min_y * inv_y) as u32).saturating_sub(margin);
    let x1 = ((max_x * inv_x) as u32).min(w - 1).saturating_add(margin).min(w - 1);
    let y1 = ((max_y * inv_y) as u32).min(h - 1).saturating_add(margin).min(h - 1);

    SaliencyBox {
        bbox: BoundingBox::new(x0.min(x1), y0.min(y1), x1, y1),
        source: SaliencySource::Estimated,
    }
}

/// Spectral-residual saliency of `gray`, scaled to `[0, 255]` at the same
/// size. `None` when the map has no contrast.
fn saliency_map(gray: &GrayImage) -> Option<GrayImage> {
    let n = SPECTRUM_SIZE;
    let first = gray.get_pixel(0, 0)[0];
    if gray.pixels().all(|p| p[0] == first) {
        return None;
    }
    let thumb = imageops::resize(gray, n as u32, n as u32, FilterType::Triangle);

    let mut spectrum: Vec<(f64, f64)> = thumb.pixels().map(|p| (p[0] as f64, 0.0)).collect();
    dft_2d(&mut spectrum, n, false);

    let log_amplitude: Vec<f64> = spectrum
        .iter()
        .map(|&(re, im)| (re * re + im * im).sqrt().max(1e-12).ln())
        .collect();
    let smoothed = box_mean(&log_amplitude, n, 1);

    for (i, value) in spectrum.iter_mut().enumerate() {
        let phase = value.1.atan2(value.0);
        let magnitude = (log_amplitude[i] - smoothed[i]).exp();
        *value = (magnitude * phase.cos(), magnitude * phase.sin());
    }
    dft_2d(&mut spectrum, n, true);

    let energy: Vec<f64> = spectrum.iter().map(|&(re, im)| re * re + im * im).collect();
    let energy = box_mean(&energy, n, 2);

    let (lo, hi) = energy
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if !(hi - lo).is_normal() {
        return None;
    }

    let normalized: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_fn(n as u32, n as u32, |x, y| {
            Luma([((energy[y as usize * n + x as usize] - lo) / (hi - lo)) as f32])
        });
    let resized = imageops::resize(&normalized, gray.width(), gray.height(), FilterType::Triangle);

    Some(GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        Luma([(resized.get_pixel(x, y)[0] * 255.0).clamp(0.0, 255.0) as u8])
    }))
}

/// In-place separable 2D DFT of an `n×n` row-major grid.
fn dft_2d(data: &mut [(f64, f64)], n: usize, inverse: bool) {
    let sign = if inverse { 1.0 } else { -1.0 };
    let twiddles: Vec<(f64, f64)> = (0..n)
        .map(|k| {
            let angle = sign * 2.0 * PI * k as f64 / n as f64;
            (angle.cos(), angle.sin())
        })
        .collect();

    let mut line = vec![(0.0, 0.0); n];
    let transform = |line: &mut [(f64, f64)]| {
        let input = line.to_vec();
        for (k, out) in line.iter_mut().enumerate() {
            let (mut re, mut im) = (0.0, 0.0);
            for (j, &(xr, xi)) in input.iter().enumerate() {
                let (c, s) = twiddles[(k * j) % n];
                re += xr * c - xi * s;
                im += xr * s + xi * c;
            }
            *out = (re, im);
        }
    };

    for row in 0..n {
        transform(&mut data[row * n..(row + 1) * n]);
    }
    for col in 0..n {
        for row in 0..n {
            line[row] = data[row * n + col];
        }
        transform(line.as_mut_slice());
        for row in 0..n {
            data[row * n + col] = line[row];
        }
    }

    if inverse {
        let norm = (n * n) as f64;
        for v in data.iter_mut() {
            *v = (v.0 / norm, v.1 / norm);
        }
    }
}

/// Mean over a `(2r+1)²` window with edge clamping.
fn box_mean(values: &[f64], n: usize, radius: usize) -> Vec<f64> {
    let r = radius as isize;
    let last = n as isize - 1;
    let mut out = vec![0.0; values.len()];
    for y in 0..n as isize {
        for x in 0..n as isize {
            let mut sum = 0.0;
            for dy in -r..=r {
                for dx in -r..=r {
                    let sx = (x + dx).clamp(0, last) as usize;
                    let sy = (y + dy).clamp(0, last) as usize;
                    sum += values[sy * n + sx];
                }
            }
            out[y as usize * n + x as usize] = sum / ((2 * r + 1) * (2 * r + 1)) as f64;
        }
    }
    out
}

/// Shoelace area of a closed contour.
fn polygon_area(points: &[imageproc::point::Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();
    (twice as f64 / 2.0).abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use image::Rgba;
    use imageproc::point::Point;

    fn spot(width: u32, height: u32, cx: u32, cy: u32, half: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            if x.abs_diff(cx) <= half && y.abs_diff(cy) <= half {
                Rgba([250, 250, 250, 255])
            } else {
                Rgba([30, 30, 30, 255])
            }
        })
    }

    #[test]
    fn finds_isolated_bright_square() {
        let img = spot(128, 128, 88, 40, 10);
        let found = bbox_from_saliency(&img);

        assert_eq!(found.source, SaliencySource::Estimated);
        let b = found.bbox;
        assert!(b.x0 <= 88 && 88 <= b.x1, "{b:?}");
        assert!(b.y0 <= 40 && 40 <= b.y1, "{b:?}");
        assert!(b.area() < 128 * 128);
    }

    #[test]
    fn bbox_stays_inside_large_images() {
        let img = spot(600, 300, 450, 200, 40);
        let b = bbox_from_saliency(&img).bbox;
        assert!(b.x1 < 600 && b.y1 < 300);
    }

    #[test]
    fn flat_image_falls_back_to_full_frame() {
        let found = bbox_from_saliency(&solid(100, 80, RED));
        assert_eq!(found.source, SaliencySource::FullImage);
        assert_eq!(found.bbox, BoundingBox::full(100, 80));
    }

    #[test]
    fn tiny_image_falls_back_to_full_frame() {
        let found = bbox_from_saliency(&solid(3, 3, RED));
        assert_eq!(found.source, SaliencySource::FullImage);
    }

    #[test]
    fn dft_round_trip_restores_signal() {
        let n = 8;
        let original: Vec<(f64, f64)> = (0..n * n).map(|i| ((i % 7) as f64, 0.0)).collect();
        let mut data = original.clone();
        dft_2d(&mut data, n, false);
        dft_2d(&mut data, n, true);
        for (a, b) in original.iter().zip(&data) {
            assert!((a.0 - b.0).abs() < 1e-9 && b.1.abs() < 1e-9);
        }
    }

    #[test]
    fn polygon_area_of_square() {
        let square = [
            Point::new(0, 0),
            Point::new(4, 0),
            Point::new(4, 4),
            Point::new(0, 4),
        ];
        assert_eq!(polygon_area(&square), 16.0);
    }
}
