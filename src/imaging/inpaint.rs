//! Border fill for padded canvases.
//!
//! Fully transparent pixels are treated as holes and filled from the
//! surrounding content. The result is always opaque. Pixels are visited in
//! order of their chessboard distance from known content, so each hole pixel
//! only ever reads from pixels that are already known or filled.
//!
//! - [`InpaintMethod::Telea`]: distance-weighted average over a small radius,
//!   nearer and earlier-filled pixels counting more.
//! - [`InpaintMethod::Ns`]: plain average of filled neighbours (onion peel),
//!   then Jacobi iterations of the Laplace equation over the hole region.

use super::params::InpaintMethod;
use image::{Rgba, RgbaImage};
use std::collections::VecDeque;

const TELEA_RADIUS: i64 = 3;
const DIFFUSION_ITERATIONS: usize = 30;

/// Fill every `alpha == 0` pixel of `img` using `method`.
///
/// Images with no known pixel at all are returned unchanged.
pub fn inpaint(img: RgbaImage, method: InpaintMethod) -> RgbaImage {
    if method == InpaintMethod::None {
        return img;
    }
    let (w, h) = (img.width() as usize, img.height() as usize);
    let known: Vec<bool> = img.pixels().map(|p| p[3] != 0).collect();
    if !known.iter().any(|&k| k) {
        log::warn!("inpaint skipped: no opaque content to sample from");
        return img;
    }

    let mut colors: Vec<[f32; 3]> = img
        .pixels()
        .map(|p| [p[0] as f32, p[1] as f32, p[2] as f32])
        .collect();
    let (order, level) = fill_order(&known, w, h);

    match method {
        InpaintMethod::Telea => fill_weighted(&mut colors, &order, &level, w, h),
        InpaintMethod::Ns => {
            fill_onion(&mut colors, &order, &level, w, h);
            diffuse(&mut colors, &known, w, h);
        }
        InpaintMethod::None => {}
    }

    RgbaImage::from_fn(img.width(), img.height(), |x, y| {
        let c = colors[y as usize * w + x as usize];
        Rgba([round(c[0]), round(c[1]), round(c[2]), 255])
    })
}

fn round(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Multi-source BFS from known pixels. Returns hole pixels in visiting order
/// and every pixel's distance level (0 for known).
fn fill_order(known: &[bool], w: usize, h: usize) -> (Vec<usize>, Vec<u32>) {
    let mut level = vec![u32::MAX; known.len()];
    let mut queue = VecDeque::new();
    for (i, &k) in known.iter().enumerate() {
        if k {
            level[i] = 0;
            queue.push_back(i);
        }
    }

    let mut order = Vec::new();
    while let Some(i) = queue.pop_front() {
        let (x, y) = ((i % w) as i64, (i / w) as i64);
        for (nx, ny) in neighbours(x, y, 1, w, h) {
            let j = ny * w + nx;
            if level[j] == u32::MAX {
                level[j] = level[i] + 1;
                order.push(j);
                queue.push_back(j);
            }
        }
    }
    (order, level)
}

/// In-bounds pixels within chessboard distance `r` of `(x, y)`, excluding it.
fn neighbours(x: i64, y: i64, r: i64, w: usize, h: usize) -> impl Iterator<Item = (usize, usize)> {
    (-r..=r)
        .flat_map(move |dy| (-r..=r).map(move |dx| (dx, dy)))
        .filter(|&(dx, dy)| dx != 0 || dy != 0)
        .map(move |(dx, dy)| (x + dx, y + dy))
        .filter(move |&(nx, ny)| nx >= 0 && ny >= 0 && nx < w as i64 && ny < h as i64)
        .map(|(nx, ny)| (nx as usize, ny as usize))
}

fn fill_weighted(colors: &mut [[f32; 3]], order: &[usize], level: &[u32], w: usize, h: usize) {
    for &i in order {
        let (x, y) = ((i % w) as i64, (i / w) as i64);
        let mut sum = [0.0f32; 3];
        let mut total = 0.0f32;
        for (nx, ny) in neighbours(x, y, TELEA_RADIUS, w, h) {
            let j = ny * w + nx;
            if level[j] >= level[i] {
                continue;
            }
            let dx = nx as f32 - x as f32;
            let dy = ny as f32 - y as f32;
            let weight = 1.0 / ((dx * dx + dy * dy) * (1.0 + (level[i] - level[j]) as f32));
            for c in 0..3 {
                sum[c] += colors[j][c] * weight;
            }
            total += weight;
        }
        if total > 0.0 {
            colors[i] = [sum[0] / total, sum[1] / total, sum[2] / total];
        }
    }
}

fn fill_onion(colors: &mut [[f32; 3]], order: &[usize], level: &[u32], w: usize, h: usize) {
    for &i in order {
        let (x, y) = ((i % w) as i64, (i / w) as i64);
        let mut sum = [0.0f32; 3];
        let mut count = 0.0f32;
        for (nx, ny) in neighbours(x, y, 1, w, h) {
            let j = ny * w + nx;
            if level[j] < level[i] {
                for c in 0..3 {
                    sum[c] += colors[j][c];
                }
                count += 1.0;
            }
        }
        if count > 0.0 {
            colors[i] = [sum[0] / count, sum[1] / count, sum[2] / count];
        }
    }
}

/// Relax hole pixels towards the mean of their 4-neighbours.
fn diffuse(colors: &mut [[f32; 3]], known: &[bool], w: usize, h: usize) {
    let holes: Vec<usize> = (0..known.len()).filter(|&i| !known[i]).collect();
    for _ in 0..DIFFUSION_ITERATIONS {
        let previous = colors.to_vec();
        for &i in &holes {
            let (x, y) = (i % w, i / w);
            let mut sum = [0.0f32; 3];
            let mut count = 0.0f32;
            let candidates = [
                (x > 0).then(|| i - 1),
                (x + 1 < w).then(|| i + 1),
                (y > 0).then(|| i - w),
                (y + 1 < h).then(|| i + w),
            ];
            for j in candidates.into_iter().flatten() {
                for c in 0..3 {
                    sum[c] += previous[j][c];
                }
                count += 1.0;
            }
            if count > 0.0 {
                colors[i] = [sum[0] / count, sum[1] / count, sum[2] / count];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    #[test]
    fn none_is_identity() {
        let img = padded_sprite(4, 4, 3, RED);
        assert_eq!(inpaint(img.clone(), InpaintMethod::None), img);
    }

    #[test]
    fn telea_fills_border_with_content_color() {
        let img = padded_sprite(6, 6, 5, RED);
        let out = inpaint(img, InpaintMethod::Telea);
        assert_eq!(count_alpha(&out, 255), 16 * 16);
        // Uniform content means a uniform fill
        assert!(out.pixels().all(|p| p.0 == RED.0));
    }

    #[test]
    fn ns_fills_border_with_content_color() {
        let out = inpaint(padded_sprite(6, 6, 5, BLUE), InpaintMethod::Ns);
        assert!(out.pixels().all(|p| p.0 == BLUE.0));
    }

    #[test]
    fn fill_blends_between_two_sources() {
        // Red column on the left, blue column on the right, gap between
        let mut img = solid(11, 3, CLEAR);
        for y in 0..3 {
            img.put_pixel(0, y, RED);
            img.put_pixel(10, y, BLUE);
        }
        for method in [InpaintMethod::Telea, InpaintMethod::Ns] {
            let out = inpaint(img.clone(), method);
            let near_red = out.get_pixel(1, 1);
            let near_blue = out.get_pixel(9, 1);
            assert!(near_red[0] > near_blue[0], "{method:?}");
            assert!(near_blue[2] > near_red[2], "{method:?}");
        }
    }

    #[test]
    fn content_pixels_keep_their_color() {
        let img = padded_sprite(4, 4, 2, RED);
        let out = inpaint(img, InpaintMethod::Telea);
        assert_eq!(out.get_pixel(3, 3), &RED);
    }

    #[test]
    fn empty_canvas_is_returned_unchanged() {
        let img = solid(5, 5, CLEAR);
        assert_eq!(inpaint(img.clone(), InpaintMethod::Ns), img);
    }

    #[test]
    fn levels_grow_with_distance() {
        let known = vec![true, false, false, false];
        let (order, level) = fill_order(&known, 4, 1);
        assert_eq!(order, vec![1, 2, 3]);
        assert_eq!(level, vec![0, 1, 2, 3]);
    }
}
