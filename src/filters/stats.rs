//! Whole-page brightness statistics and the cheap point filters built on them.
use crate::image::{BrightnessGrid, ImageView, WHITE};

/// Mean brightness below which a page is treated as white-on-black.
pub const INVERSION_THRESHOLD: f64 = 48.0;
/// Buckets of the coarse brightness histogram (8 brightness levels each).
pub const HISTOGRAM_BUCKETS: usize = 16;
/// More non-empty histogram buckets than this marks a grayscale page.
pub const BINARY_MAX_BUCKETS: usize = 2;
/// Buckets of the gradient histogram used by [`measure_contrast`].
pub const CONTRAST_BUCKETS: usize = 32;
/// Share of gradient mass, counted from the steepest bucket down, that
/// locates the contrast bucket.
pub const CONTRAST_TOP_FRACTION: f64 = 0.05;

pub fn brightness_histogram(grid: &BrightnessGrid) -> [usize; HISTOGRAM_BUCKETS] {
    let mut hist = [0usize; HISTOGRAM_BUCKETS];
    let bucket_width = (WHITE as usize + 1) / HISTOGRAM_BUCKETS;
    for &v in grid.as_raw() {
        hist[(v as usize / bucket_width).min(HISTOGRAM_BUCKETS - 1)] += 1;
    }
    hist
}

pub fn is_inverted(grid: &BrightnessGrid) -> bool {
    !grid.as_raw().is_empty() && grid.mean() < INVERSION_THRESHOLD
}

/// Turn white-on-black into black-on-white.
pub fn invert(grid: &mut BrightnessGrid) {
    for v in grid.as_raw_mut() {
        *v = WHITE - *v;
    }
}

pub fn is_grayscale(grid: &BrightnessGrid) -> bool {
    brightness_histogram(grid).iter().filter(|&&c| c > 0).count() > BINARY_MAX_BUCKETS
}

/// Sharpness proxy: the gradient bucket reached after accumulating
/// [`CONTRAST_TOP_FRACTION`] of all non-flat pixels from the steepest bucket
/// downwards.
///
/// A pixel's gradient is the mean absolute brightness difference to its
/// (existing) 4-neighbours; buckets are 4 brightness levels wide.
pub fn measure_contrast(grid: &BrightnessGrid) -> usize {
    let (w, h) = (grid.width(), grid.height());
    let mut hist = [0usize; CONTRAST_BUCKETS];
    let mut total = 0usize;
    for y in 0..h {
        for x in 0..w {
            let v = grid.get(x, y) as i32;
            let mut sum = 0i32;
            let mut n = 0i32;
            let mut visit = |nx: usize, ny: usize| {
                sum += (v - grid.get(nx, ny) as i32).abs();
                n += 1;
            };
            if x > 0 {
                visit(x - 1, y);
            }
            if x + 1 < w {
                visit(x + 1, y);
            }
            if y > 0 {
                visit(x, y - 1);
            }
            if y + 1 < h {
                visit(x, y + 1);
            }
            if n == 0 || sum == 0 {
                continue;
            }
            let gradient = sum as f32 / n as f32;
            let bucket = ((gradient / 4.0) as usize).min(CONTRAST_BUCKETS - 1);
            hist[bucket] += 1;
            total += 1;
        }
    }
    if total == 0 {
        return 0;
    }
    let target = (total as f64 * CONTRAST_TOP_FRACTION).ceil() as usize;
    let mut acc = 0usize;
    for bucket in (0..CONTRAST_BUCKETS).rev() {
        acc += hist[bucket];
        if acc >= target {
            return bucket;
        }
    }
    0
}

/// Snap every pixel at or above the mean brightness to white. Returns the
/// number of pixels changed.
pub fn white_balance(grid: &mut BrightnessGrid) -> usize {
    let mean = grid.mean();
    let mut changed = 0;
    for v in grid.as_raw_mut() {
        if *v < WHITE && *v as f64 >= mean {
            *v = WHITE;
            changed += 1;
        }
    }
    changed
}
