//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images:
//! output-size suggestion ([`calculate_target_size`]), integer scale choice for
//! pixel art, and the fit/fill/centre arithmetic the fitter relies on.

use crate::types::{MAX_DIMENSION, SizeMode, Target, TargetSize};

/// Fallback output size for degenerate (zero-area) inputs.
pub const FALLBACK_SIZE: TargetSize = TargetSize {
    width: 256,
    height: 256,
};

/// Floor applied to the short side in power-of-two and auto modes.
const MIN_SHORT_SIDE: u32 = 8;

/// Round to the nearest power of two.
///
/// Compares the next power `p >= value` against `p / 2`; an exact tie picks
/// the larger. Zero maps to 1.
///
/// # Examples
/// ```
/// # use asset_normalizer::imaging::round_to_power_of_two;
/// assert_eq!(round_to_power_of_two(100), 128);
/// assert_eq!(round_to_power_of_two(65), 64);
/// assert_eq!(round_to_power_of_two(96), 128);
/// ```
pub fn round_to_power_of_two(value: u32) -> u32 {
    if value == 0 {
        return 1;
    }
    let Some(upper) = value.checked_next_power_of_two() else {
        return 1 << 31;
    };
    let lower = (upper / 2).max(1);
    if upper - value <= value - lower {
        upper
    } else {
        lower
    }
}

/// Round to the nearest multiple of `multiple`, halves rounding away from zero.
/// Zero maps to `multiple`.
pub fn round_to_multiple(value: u32, multiple: u32) -> u32 {
    let m = multiple.max(1) as u64;
    if value == 0 {
        return m as u32;
    }
    let v = value as u64;
    ((2 * v + m) / (2 * m) * m).min(u32::MAX as u64) as u32
}

/// Short side derived from a rounded long side and the source aspect ratio.
fn derive_short(long: u32, src_long: u32, src_short: u32) -> u32 {
    (long as f64 * src_short as f64 / src_long as f64).round() as u32
}

/// Calculate the output box for an input of `width`×`height` under `mode`.
///
/// - `Square` / `Custom` return the caller's dimensions.
/// - `PowerOfTwo` rounds the long side to a power of two, derives the short
///   side from the aspect ratio, rounds it the same way and floors it at 8
///   (the long side shares the floor so it never ends up shorter).
/// - `Multiple(m)` does the same with multiples of `m`, floored at `m`.
/// - `Auto` rounds the long side to a power of two, floors the derived short
///   side at 8, then snaps both sides to multiples of 8.
///
/// Zero-sized inputs fall back to 256×256. Results are clamped to
/// `[1, MAX_DIMENSION]`.
pub fn calculate_target_size(width: u32, height: u32, mode: SizeMode) -> TargetSize {
    let landscape = width >= height;
    let (src_long, src_short) = if landscape {
        (width, height)
    } else {
        (height, width)
    };

    let (long, short) = match mode {
        SizeMode::Square(side) => return TargetSize::clamped(side, side),
        SizeMode::Custom(size) => return size,
        _ if width == 0 || height == 0 => return FALLBACK_SIZE,
        SizeMode::PowerOfTwo => {
            let long = round_to_power_of_two(src_long).max(MIN_SHORT_SIDE);
            let short = round_to_power_of_two(derive_short(long, src_long, src_short))
                .max(MIN_SHORT_SIDE);
            (long, short)
        }
        SizeMode::Multiple(multiple) => {
            let m = multiple.get();
            let long = round_to_multiple(src_long, m).max(m);
            let short = round_to_multiple(derive_short(long, src_long, src_short), m).max(m);
            (long, short)
        }
        SizeMode::Auto => {
            let long = round_to_power_of_two(src_long).max(MIN_SHORT_SIDE);
            let short = derive_short(long, src_long, src_short).max(MIN_SHORT_SIDE);
            (
                round_to_multiple(long, MIN_SHORT_SIDE),
                round_to_multiple(short, MIN_SHORT_SIDE),
            )
        }
    };

    if landscape {
        TargetSize::clamped(long, short)
    } else {
        TargetSize::clamped(short, long)
    }
}

/// Resolve the output target for an image: square mode keeps the square
/// fitting path, every other mode produces an explicit box.
pub fn resolve_target(width: u32, height: u32, mode: SizeMode) -> Target {
    match mode {
        SizeMode::Square(side) => Target::Square(side.clamp(1, MAX_DIMENSION)),
        other => Target::Box(calculate_target_size(width, height, other)),
    }
}

/// Largest integer factor that keeps both scaled dimensions within `target`.
///
/// Never returns less than 1, so sources larger than the target are left for
/// the downscaling fit step.
///
/// # Examples
/// ```
/// # use asset_normalizer::imaging::choose_integer_scale;
/// assert_eq!(choose_integer_scale((100, 50), 512), 5);
/// assert_eq!(choose_integer_scale((37, 52), 256), 4);
/// ```
pub fn choose_integer_scale(source: (u32, u32), target: u32) -> u32 {
    choose_integer_scale_for_box(source, (target, target))
}

/// [`choose_integer_scale`] for a rectangular box: each axis is bounded by its
/// own target dimension.
pub fn choose_integer_scale_for_box(source: (u32, u32), target: (u32, u32)) -> u32 {
    let (w, h) = source;
    let (tw, th) = target;
    (tw / w.max(1)).min(th / h.max(1)).max(1)
}

/// Dimensions after scaling the long side down to `target_long`.
///
/// Returns `source` unchanged when it already fits (never upscales). The short
/// side is truncated and kept at least 1.
pub fn calculate_fit_long_dimensions(source: (u32, u32), target_long: u32) -> (u32, u32) {
    let (w, h) = source;
    if w.max(h) <= target_long {
        return source;
    }
    if w >= h {
        let new_h = (h as f64 * (target_long as f64 / w as f64)) as u32;
        (target_long, new_h.max(1))
    } else {
        let new_w = (w as f64 * (target_long as f64 / h as f64)) as u32;
        (new_w.max(1), target_long)
    }
}

/// Dimensions that fit `source` inside `target` preserving aspect ratio.
///
/// Returns `source` unchanged when it already fits. The constrained axis is
/// chosen by comparing aspect ratios, and a final clamp guards against
/// floating-point overshoot so neither result exceeds the box.
pub fn calculate_fit_box_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (w, h) = source;
    let (tw, th) = target;
    if w <= tw && h <= th {
        return source;
    }

    let img_aspect = if h > 0 { w as f64 / h as f64 } else { 1.0 };
    let target_aspect = if th > 0 { tw as f64 / th as f64 } else { 1.0 };

    let (mut new_w, mut new_h) = if img_aspect >= target_aspect {
        // Wider than the box: width is the constraint
        let new_h = (h as f64 * (tw as f64 / w as f64)) as u32;
        (tw, new_h.max(1))
    } else {
        // Taller than the box: height is the constraint
        let new_w = (w as f64 * (th as f64 / h as f64)) as u32;
        (new_w.max(1), th)
    };

    if new_w > tw {
        new_h = ((new_h as f64 * (tw as f64 / new_w as f64)) as u32).max(1);
        new_w = tw;
    }
    if new_h > th {
        new_w = ((new_w as f64 * (th as f64 / new_h as f64)) as u32).max(1);
        new_h = th;
    }
    (new_w, new_h)
}

/// Calculate dimensions needed to fill a target area (resize before crop).
///
/// Returns dimensions that completely cover the target area while maintaining
/// the source aspect ratio. One dimension will match exactly, the other may
/// exceed.
pub fn calculate_fill_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let src_aspect = src_w as f64 / src_h.max(1) as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h.max(1) as f64;

    if src_aspect > tgt_aspect {
        // Source is wider: height will match, width will exceed
        let h = tgt_h;
        let w = ((h as f64 * src_aspect).round() as u32).max(tgt_w);
        (w, h)
    } else {
        // Source is taller: width will match, height will exceed
        let w = tgt_w;
        let h = ((w as f64 / src_aspect).round() as u32).max(tgt_h);
        (w, h)
    }
}

/// Offset that centres `inner` within `outer` (floor division).
pub fn centered_offset(outer: (u32, u32), inner: (u32, u32)) -> (u32, u32) {
    (
        outer.0.saturating_sub(inner.0) / 2,
        outer.1.saturating_sub(inner.1) / 2,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Multiple;

    fn multiple(m: u32) -> SizeMode {
        SizeMode::Multiple(Multiple::try_from(m).unwrap())
    }

    // =========================================================================
    // round_to_power_of_two tests
    // =========================================================================

    #[test]
    fn power_of_two_rounds_up_when_closer() {
        assert_eq!(round_to_power_of_two(100), 128);
    }

    #[test]
    fn power_of_two_rounds_down_when_closer() {
        assert_eq!(round_to_power_of_two(65), 64);
        assert_eq!(round_to_power_of_two(95), 64);
    }

    #[test]
    fn power_of_two_exact_tie_prefers_larger() {
        // 96 is 32 away from both 64 and 128
        assert_eq!(round_to_power_of_two(96), 128);
        assert_eq!(round_to_power_of_two(97), 128);
        // 3 is 1 away from both 2 and 4
        assert_eq!(round_to_power_of_two(3), 4);
        // 6 is 2 away from both 4 and 8
        assert_eq!(round_to_power_of_two(6), 8);
    }

    #[test]
    fn power_of_two_exact_powers_unchanged() {
        for p in [1, 2, 4, 256, 4096] {
            assert_eq!(round_to_power_of_two(p), p);
        }
    }

    #[test]
    fn power_of_two_zero_is_one() {
        assert_eq!(round_to_power_of_two(0), 1);
    }

    // =========================================================================
    // round_to_multiple tests
    // =========================================================================

    #[test]
    fn multiple_rounds_half_away_from_zero() {
        assert_eq!(round_to_multiple(12, 8), 16);
        assert_eq!(round_to_multiple(11, 8), 8);
        assert_eq!(round_to_multiple(20, 8), 24);
        assert_eq!(round_to_multiple(3, 2), 4);
    }

    #[test]
    fn multiple_zero_is_the_multiple() {
        assert_eq!(round_to_multiple(0, 16), 16);
    }

    // =========================================================================
    // calculate_target_size tests
    // =========================================================================

    #[test]
    fn target_power_of_two_landscape() {
        // 300 → 256; short = round(256 / 1.5) = 171 → 128
        assert_eq!(
            calculate_target_size(300, 200, SizeMode::PowerOfTwo),
            TargetSize { width: 256, height: 128 }
        );
    }

    #[test]
    fn target_power_of_two_portrait_floors_short_side() {
        // 100x1000: long 1024, short = round(102.4) = 102 → 128
        assert_eq!(
            calculate_target_size(100, 1000, SizeMode::PowerOfTwo),
            TargetSize { width: 128, height: 1024 }
        );
        // Very thin strip: short would be 1, floored to 8
        assert_eq!(
            calculate_target_size(1000, 2, SizeMode::PowerOfTwo),
            TargetSize { width: 1024, height: 8 }
        );
    }

    #[test]
    fn target_multiple_mode() {
        // 100x50 with 16: long 96, short = 48 → 48
        assert_eq!(
            calculate_target_size(100, 50, multiple(16)),
            TargetSize { width: 96, height: 48 }
        );
        // Short side floored at the multiple
        assert_eq!(
            calculate_target_size(500, 3, multiple(8)),
            TargetSize { width: 504, height: 8 }
        );
        // Tiny input: long side shares the floor
        assert_eq!(
            calculate_target_size(3, 3, multiple(16)),
            TargetSize { width: 16, height: 16 }
        );
    }

    #[test]
    fn target_auto_snaps_to_multiple_of_eight() {
        // 100x50: long 128, short 64
        assert_eq!(
            calculate_target_size(100, 50, SizeMode::Auto),
            TargetSize { width: 128, height: 64 }
        );
        // 300x200: long 256, short round(170.67) = 171 → 168
        assert_eq!(
            calculate_target_size(300, 200, SizeMode::Auto),
            TargetSize { width: 256, height: 168 }
        );
    }

    #[test]
    fn target_degenerate_input_falls_back() {
        assert_eq!(calculate_target_size(0, 100, SizeMode::Auto), FALLBACK_SIZE);
        assert_eq!(calculate_target_size(100, 0, SizeMode::PowerOfTwo), FALLBACK_SIZE);
        assert_eq!(calculate_target_size(0, 0, multiple(4)), FALLBACK_SIZE);
    }

    #[test]
    fn target_is_always_within_bounds() {
        let modes = [SizeMode::Auto, SizeMode::PowerOfTwo, multiple(2), multiple(16)];
        for mode in modes {
            for (w, h) in [(1, 1), (1, 10_000), (10_000, 1), (7000, 6500), (3, 3)] {
                let t = calculate_target_size(w, h, mode);
                assert!(
                    (1..=MAX_DIMENSION).contains(&t.width)
                        && (1..=MAX_DIMENSION).contains(&t.height),
                    "{mode:?} {w}x{h} → {t}"
                );
            }
        }
    }

    #[test]
    fn target_fixed_modes_pass_through() {
        let custom = TargetSize::new(640, 480).unwrap();
        assert_eq!(calculate_target_size(10, 10, SizeMode::Custom(custom)), custom);
        assert_eq!(
            calculate_target_size(10, 10, SizeMode::Square(512)),
            TargetSize { width: 512, height: 512 }
        );
    }

    #[test]
    fn resolve_target_square_vs_box() {
        assert_eq!(resolve_target(37, 52, SizeMode::Square(256)), Target::Square(256));
        assert_eq!(
            resolve_target(100, 50, SizeMode::Auto),
            Target::Box(TargetSize { width: 128, height: 64 })
        );
    }

    // =========================================================================
    // choose_integer_scale tests
    // =========================================================================

    #[test]
    fn integer_scale_limited_by_long_side() {
        assert_eq!(choose_integer_scale((100, 50), 512), 5);
    }

    #[test]
    fn integer_scale_never_below_one() {
        assert_eq!(choose_integer_scale((1000, 800), 256), 1);
        assert_eq!(choose_integer_scale((0, 0), 256), 256);
    }

    #[test]
    fn integer_scale_for_box_uses_each_axis() {
        // 16x16 into 128x64: width allows 8, height allows 4
        assert_eq!(choose_integer_scale_for_box((16, 16), (128, 64)), 4);
        assert_eq!(choose_integer_scale_for_box((32, 8), (128, 64)), 4);
    }

    // =========================================================================
    // calculate_fit_long_dimensions tests
    // =========================================================================

    #[test]
    fn fit_long_never_upscales() {
        assert_eq!(calculate_fit_long_dimensions((100, 50), 512), (100, 50));
    }

    #[test]
    fn fit_long_truncates_short_side() {
        // 1000x333 → 512 x int(333 * 0.512) = 170
        assert_eq!(calculate_fit_long_dimensions((1000, 333), 512), (512, 170));
        assert_eq!(calculate_fit_long_dimensions((333, 1000), 512), (170, 512));
    }

    #[test]
    fn fit_long_keeps_short_side_positive() {
        assert_eq!(calculate_fit_long_dimensions((5000, 1), 100), (100, 1));
    }

    // =========================================================================
    // calculate_fit_box_dimensions tests
    // =========================================================================

    #[test]
    fn fit_box_wide_image() {
        // 800x200 into 400x300: width-constrained → 400x100
        assert_eq!(calculate_fit_box_dimensions((800, 200), (400, 300)), (400, 100));
    }

    #[test]
    fn fit_box_tall_image() {
        // 300x600 into 400x300: height-constrained → 150x300
        assert_eq!(calculate_fit_box_dimensions((300, 600), (400, 300)), (150, 300));
    }

    #[test]
    fn fit_box_already_inside() {
        assert_eq!(calculate_fit_box_dimensions((10, 20), (400, 300)), (10, 20));
    }

    #[test]
    fn fit_box_never_exceeds_target() {
        for src in [(1001, 999), (7, 4096), (4096, 7), (333, 334), (1, 1000)] {
            for tgt in [(256, 256), (300, 200), (64, 512), (1, 1)] {
                let (w, h) = calculate_fit_box_dimensions(src, tgt);
                assert!(w <= tgt.0 && h <= tgt.1, "{src:?} into {tgt:?} → {w}x{h}");
                assert!(w >= 1 && h >= 1);
            }
        }
    }

    // =========================================================================
    // calculate_fill_dimensions tests
    // =========================================================================

    #[test]
    fn fill_wider_source_to_portrait_target() {
        // 800x600 (4:3) → 400x500 target: height matches, width 667
        assert_eq!(calculate_fill_dimensions((800, 600), (400, 500)), (667, 500));
    }

    #[test]
    fn fill_taller_source_to_landscape_target() {
        assert_eq!(calculate_fill_dimensions((600, 800), (500, 400)), (500, 667));
    }

    #[test]
    fn fill_same_aspect_ratio() {
        assert_eq!(calculate_fill_dimensions((800, 600), (400, 300)), (400, 300));
    }

    // =========================================================================
    // centered_offset tests
    // =========================================================================

    #[test]
    fn centered_offset_floors() {
        assert_eq!(centered_offset((256, 256), (148, 208)), (54, 24));
        assert_eq!(centered_offset((10, 10), (7, 10)), (1, 0));
    }
}
