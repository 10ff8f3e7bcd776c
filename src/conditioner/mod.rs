//! Page conditioning: the fixed clean-up sequence run before layout analysis.
//!
//! Stages, each skipped when it does not apply:
//! 1. inversion of white-on-black pages,
//! 2. grayscale / binary classification and contrast measurement,
//! 3. smoothing and background elimination for blurry grayscale scans,
//! 4. white balance,
//! 5. feather dusting,
//! 6. FFT skew estimation and rotation,
//! 7. content box (whitespace margin trim).
//!
//! The grid is modified in place. The content box is reported, not cropped,
//! so every later coordinate stays in page space.
mod options;

pub use options::{ConditionerOptions, SkewOptions};

use crate::fft::{get_fft, Spectrum};
use crate::filters::{
    eliminate_background, gaussian_blur, invert, is_grayscale, is_inverted, measure_contrast,
    rotate, white_balance,
};
use crate::geometry::{Rect, RectView};
use crate::image::{BrightnessGrid, PageImage};
use crate::regions::{feather_dust, DustParams, DustReport};
use log::debug;
use serde::Serialize;
use std::sync::Arc;

/// What [`ImageConditioner::correct`] found and did.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionReport {
    pub inverted: bool,
    pub grayscale: bool,
    pub contrast: usize,
    pub blurry: bool,
    pub white_balanced: usize,
    pub dust: Option<DustReport>,
    /// Estimated content rotation in degrees.
    pub skew_degrees: Option<f32>,
    pub rotated: bool,
    /// Tightest rectangle holding ink after conditioning.
    pub content_box: Option<Rect>,
}

#[derive(Clone, Debug, Default)]
pub struct ImageConditioner {
    pub options: ConditionerOptions,
    pub skew: SkewOptions,
}

impl ImageConditioner {
    pub fn new(options: ConditionerOptions, skew: SkewOptions) -> Self {
        Self { options, skew }
    }

    /// Condition the page's brightness grid in place.
    pub fn correct_page(&self, page: &mut PageImage) -> CorrectionReport {
        let dpi = page.dpi();
        self.correct(page.brightness_mut(), dpi)
    }

    pub fn correct(&self, grid: &mut BrightnessGrid, dpi: f32) -> CorrectionReport {
        let (dim, repeat) = (self.skew.spectrum_dim(), self.skew.repeat);
        self.correct_with_spectrum(grid, dpi, |g| Arc::new(get_fft(g, dim, dim, repeat)))
    }

    /// As [`correct`](Self::correct), with the skew spectrum supplied by the
    /// caller (typically through an [`AnalysisCache`](crate::cache::AnalysisCache)).
    pub fn correct_with_spectrum<F>(&self, grid: &mut BrightnessGrid, dpi: f32, spectrum: F) -> CorrectionReport
    where
        F: FnOnce(&BrightnessGrid) -> Arc<Spectrum>,
    {
        let opts = &self.options;
        let mut report = CorrectionReport::default();
        if grid.as_raw().is_empty() {
            return report;
        }

        if opts.detect_inversion && is_inverted(grid) {
            invert(grid);
            report.inverted = true;
        }

        report.grayscale = is_grayscale(grid);
        report.contrast = measure_contrast(grid);
        report.blurry = report.grayscale && report.contrast < opts.blurry_contrast_bucket;
        if report.blurry {
            if opts.smoothing_radius > 0.0 {
                gaussian_blur(grid, opts.smoothing_radius, opts.smoothing_radius, false);
            }
            eliminate_background(grid, dpi / opts.background_radius_divisor);
        }

        if opts.white_balance {
            report.white_balanced = white_balance(grid);
        }

        if opts.feather_dust {
            let mut params = DustParams::for_page(dpi, !report.grayscale, !report.blurry);
            params.min_size = ((dpi / opts.dust_min_size_divisor).round() as usize).max(1);
            params.min_solo_size = ((dpi / opts.dust_min_solo_divisor).round() as usize).max(2);
            report.dust = Some(feather_dust(grid, &params));
        }

        if self.skew.enabled && get_content_box(grid).is_some() {
            let angle = self.skew.estimator.estimate(&spectrum(grid));
            report.skew_degrees = angle;
            if let Some(a) = angle {
                if a.abs() > self.skew.granularity_deg && a.abs() < self.skew.max_correction_deg {
                    *grid = rotate(grid, -a);
                    report.rotated = true;
                }
            }
        }

        report.content_box = get_content_box(grid);
        debug!(
            "ImageConditioner::correct inverted={} grayscale={} contrast={} blurry={} skew={:?} rotated={} content={:?}",
            report.inverted,
            report.grayscale,
            report.contrast,
            report.blurry,
            report.skew_degrees,
            report.rotated,
            report.content_box
        );
        report
    }
}

/// Tightest rectangle containing every non-white pixel, or `None` for a
/// blank page.
pub fn get_content_box(grid: &BrightnessGrid) -> Option<Rect> {
    if grid.as_raw().is_empty() {
        return None;
    }
    RectView::whole(grid).content_rect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::WHITE;

    fn page_with_square(size: usize, side: usize) -> BrightnessGrid {
        let mut g = BrightnessGrid::new(size, size);
        let off = (size - side) / 2;
        for y in off..off + side {
            for x in off..off + side {
                g.set(x, y, 0);
            }
        }
        g
    }

    #[test]
    fn blank_page_is_left_untouched() {
        let mut g = BrightnessGrid::new(100, 100);
        let before = g.clone();
        let report = ImageConditioner::default().correct(&mut g, 100.0);
        assert_eq!(g, before);
        assert!(!report.inverted && !report.blurry && !report.rotated);
        assert!(report.content_box.is_none());
    }

    #[test]
    fn inverted_page_is_flipped() {
        let mut g = page_with_square(100, 20);
        invert(&mut g);
        let report = ImageConditioner::default().correct(&mut g, 100.0);
        assert!(report.inverted);
        assert_eq!(g.get(50, 50), 0);
        assert_eq!(g.get(5, 5), WHITE);
    }

    #[test]
    fn content_box_hugs_centred_square() {
        let mut g = page_with_square(200, 20);
        let report = ImageConditioner::default().correct(&mut g, 100.0);
        let r = report.content_box.expect("square survives conditioning");
        for (got, want) in [(r.left, 90), (r.right, 110), (r.top, 90), (r.bottom, 110)] {
            assert!(got.abs_diff(want) <= 1, "content box {r:?}");
        }
    }

    #[test]
    fn non_power_of_two_spectrum_still_conditions() {
        let skew = SkewOptions {
            fft_dim: 100,
            ..SkewOptions::default()
        };
        assert_eq!(skew.spectrum_dim(), 128);
        let mut g = page_with_square(200, 20);
        let report = ImageConditioner::new(ConditionerOptions::default(), skew).correct(&mut g, 100.0);
        assert!(report.content_box.is_some());
    }

    #[test]
    fn skewed_stripes_are_rotated_back() {
        let mut g = BrightnessGrid::new(256, 256);
        for y in (16..240).filter(|y| y % 12 < 4) {
            for x in 32..224 {
                g.set(x, y, 0);
            }
        }
        let mut g = rotate(&g, 3.0);
        let report = ImageConditioner::default().correct(&mut g, 300.0);
        let skew = report.skew_degrees.expect("stripes carry a direction");
        assert!((skew - 3.0).abs() < 1.0, "skew={skew}");
        assert!(report.rotated);
    }
}
