//! Gaussian smoothing of brightness grids.
//!
//! Kernels are built from a radius `r` used as the Gaussian sigma. The
//! support (half-width) is `3r`, or `r` in sharp-edged mode where the tails
//! would smear thin strokes into their neighbours. Borders replicate the
//! edge pixel. Filtering runs in float and quantizes once at the end.
use crate::image::{BrightnessGrid, ImageF32, ImageView, ImageViewMut};

/// Largest support for which equal radii use the direct 2D kernel instead of
/// two 1D passes.
pub const MAX_DIRECT_2D_SUPPORT: usize = 4;

/// Trait implemented by separable 1D filters.
pub trait SeparableFilter {
    /// Return the 1D taps (in left-to-right order). The kernel is assumed to be
    /// symmetric around its centre.
    fn taps(&self) -> &[f32];

    fn support(&self) -> usize {
        self.taps().len() / 2
    }
}

/// Normalised, truncated Gaussian.
#[derive(Clone, Debug)]
pub struct GaussianKernel {
    taps: Vec<f32>,
}

impl GaussianKernel {
    pub fn new(radius: f32, sharp_edged: bool) -> Self {
        let sigma = radius.max(1e-3);
        let reach = if sharp_edged { radius } else { 3.0 * radius };
        let support = reach.ceil().max(0.0) as usize;
        let denom = 2.0 * sigma * sigma;
        let mut taps: Vec<f32> = (0..=2 * support)
            .map(|i| {
                let d = i as f32 - support as f32;
                (-d * d / denom).exp()
            })
            .collect();
        let sum: f32 = taps.iter().sum();
        for t in &mut taps {
            *t /= sum;
        }
        Self { taps }
    }
}

impl SeparableFilter for GaussianKernel {
    #[inline]
    fn taps(&self) -> &[f32] {
        &self.taps
    }
}

/// Horizontal pass.
pub fn convolve_rows(src: &ImageF32, filter: &dyn SeparableFilter) -> ImageF32 {
    let taps = filter.taps();
    let s = filter.support() as isize;
    let (w, h) = (src.w, src.h);
    let mut out = ImageF32::new(w, h);
    if w == 0 {
        return out;
    }
    for y in 0..h {
        let src_row = src.row(y);
        let dst_row = out.row_mut(y);
        for (x, dst) in dst_row.iter_mut().enumerate() {
            let mut acc = 0.0f32;
            for (k, &t) in taps.iter().enumerate() {
                let sx = (x as isize + k as isize - s).clamp(0, w as isize - 1) as usize;
                acc += t * src_row[sx];
            }
            *dst = acc;
        }
    }
    out
}

/// Vertical pass.
pub fn convolve_cols(src: &ImageF32, filter: &dyn SeparableFilter) -> ImageF32 {
    let taps = filter.taps();
    let s = filter.support() as isize;
    let (w, h) = (src.w, src.h);
    let mut out = ImageF32::new(w, h);
    if h == 0 {
        return out;
    }
    for y in 0..h {
        let dst_row = out.row_mut(y);
        for (k, &t) in taps.iter().enumerate() {
            let sy = (y as isize + k as isize - s).clamp(0, h as isize - 1) as usize;
            let src_row = src.row(sy);
            for (dst, &v) in dst_row.iter_mut().zip(src_row) {
                *dst += t * v;
            }
        }
    }
    out
}

/// Direct 2D convolution with the outer product of `filter`'s taps.
pub fn convolve_2d(src: &ImageF32, filter: &dyn SeparableFilter) -> ImageF32 {
    let taps = filter.taps();
    let s = filter.support() as isize;
    let (w, h) = (src.w, src.h);
    let mut out = ImageF32::new(w, h);
    if w == 0 || h == 0 {
        return out;
    }
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0f32;
            for (ky, &ty) in taps.iter().enumerate() {
                let sy = (y as isize + ky as isize - s).clamp(0, h as isize - 1) as usize;
                let row = src.row(sy);
                for (kx, &tx) in taps.iter().enumerate() {
                    let sx = (x as isize + kx as isize - s).clamp(0, w as isize - 1) as usize;
                    acc += ty * tx * row[sx];
                }
            }
            out.set(x, y, acc);
        }
    }
    out
}

/// Float-domain blur with independent horizontal and vertical radii.
pub fn gaussian_blur_f32(
    src: &ImageF32,
    radius_x: f32,
    radius_y: f32,
    sharp_edged: bool,
) -> ImageF32 {
    let kx = (radius_x > 0.0).then(|| GaussianKernel::new(radius_x, sharp_edged));
    let ky = (radius_y > 0.0).then(|| GaussianKernel::new(radius_y, sharp_edged));
    match (kx, ky) {
        (Some(k), Some(_))
            if (radius_x - radius_y).abs() < f32::EPSILON
                && k.support() <= MAX_DIRECT_2D_SUPPORT =>
        {
            convolve_2d(src, &k)
        }
        (Some(kx), Some(ky)) => convolve_cols(&convolve_rows(src, &kx), &ky),
        (Some(kx), None) => convolve_rows(src, &kx),
        (None, Some(ky)) => convolve_cols(src, &ky),
        (None, None) => src.clone(),
    }
}

/// Blur `grid` in place; output is clamped to `[0, 127]`.
pub fn gaussian_blur(grid: &mut BrightnessGrid, radius_x: f32, radius_y: f32, sharp_edged: bool) {
    if (radius_x <= 0.0 && radius_y <= 0.0) || grid.is_empty() {
        return;
    }
    let blurred = gaussian_blur_f32(
        &ImageF32::from_brightness(grid),
        radius_x,
        radius_y,
        sharp_edged,
    );
    *grid = blurred.to_brightness();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::WHITE;

    #[test]
    fn kernel_is_normalised_with_expected_support() {
        let k = GaussianKernel::new(2.0, false);
        assert_eq!(k.support(), 6);
        let sum: f32 = k.taps().iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert_eq!(GaussianKernel::new(2.0, true).support(), 2);
    }

    #[test]
    fn blur_preserves_flat_regions() {
        let mut g = BrightnessGrid::new(20, 20);
        gaussian_blur(&mut g, 1.5, 1.5, false);
        assert!(g.as_raw().iter().all(|&v| v == WHITE));
    }

    #[test]
    fn blur_softens_a_dot_and_keeps_range() {
        let mut g = BrightnessGrid::new(21, 21);
        g.set(10, 10, 0);
        gaussian_blur(&mut g, 1.0, 1.0, false);
        let centre = g.get(10, 10);
        assert!(centre > 0 && centre < WHITE, "centre={centre}");
        assert!(g.get(11, 10) < WHITE);
        assert!(g.as_raw().iter().all(|&v| v <= WHITE));
    }

    #[test]
    fn separable_and_direct_paths_agree() {
        let mut src = ImageF32::new(15, 15);
        src.set(7, 7, 100.0);
        src.set(3, 9, 50.0);
        let k = GaussianKernel::new(1.0, false);
        let a = convolve_2d(&src, &k);
        let b = convolve_cols(&convolve_rows(&src, &k), &k);
        for (x, y) in a.data.iter().zip(&b.data) {
            assert!((x - y).abs() < 1e-3);
        }
    }

    #[test]
    fn horizontal_only_blur_leaves_columns_alone() {
        let mut g = BrightnessGrid::new(11, 11);
        for y in 0..11 {
            g.set(5, y, 0);
        }
        gaussian_blur(&mut g, 1.0, 0.0, false);
        // every row identical after a horizontal-only pass
        let first = g.row(0).to_vec();
        assert!((1..11).all(|y| g.row(y) == first.as_slice()));
    }
}
