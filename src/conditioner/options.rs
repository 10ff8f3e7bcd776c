//! Knobs of the page conditioner and the skew corrector.
//!
//! Sizes are DPI divisors so the same configuration works at any scan
//! resolution: a divisor of 12 at 300 DPI means 25 pixels.
use crate::fft::SkewEstimator;
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ConditionerOptions {
    /// Flip white-on-black pages.
    pub detect_inversion: bool,
    /// Grayscale pages whose contrast bucket is below this are blurry.
    pub blurry_contrast_bucket: usize,
    /// Gaussian radius applied to blurry pages before background removal.
    pub smoothing_radius: f32,
    /// Background estimate radius is `dpi / background_radius_divisor`.
    pub background_radius_divisor: f32,
    pub white_balance: bool,
    pub feather_dust: bool,
    /// Always-removed speck size is `dpi / dust_min_size_divisor`.
    pub dust_min_size_divisor: f32,
    /// Speck size that survives alone is `dpi / dust_min_solo_divisor`.
    pub dust_min_solo_divisor: f32,
}

impl Default for ConditionerOptions {
    fn default() -> Self {
        Self {
            detect_inversion: true,
            blurry_contrast_bucket: 6,
            smoothing_radius: 1.0,
            background_radius_divisor: 12.0,
            white_balance: true,
            feather_dust: true,
            dust_min_size_divisor: 100.0,
            dust_min_solo_divisor: 25.0,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SkewOptions {
    pub enabled: bool,
    /// Side of the square spectrum (power of two).
    pub fft_dim: usize,
    /// Tile the page over the spectrum grid instead of padding with white.
    pub repeat: bool,
    /// Rotations at or below this are not worth resampling the page.
    pub granularity_deg: f32,
    /// Larger estimates are rejected as grid or stain artifacts.
    pub max_correction_deg: f32,
    pub estimator: SkewEstimator,
}

impl Default for SkewOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            fft_dim: 256,
            repeat: false,
            granularity_deg: 0.1,
            max_correction_deg: 12.0,
            estimator: SkewEstimator::default(),
        }
    }
}

impl SkewOptions {
    /// `fft_dim` rounded up to the power of two the transform needs.
    pub fn spectrum_dim(&self) -> usize {
        self.fft_dim.max(1).next_power_of_two()
    }
}
