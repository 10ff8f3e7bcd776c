//! Brightness-grid filters used by the page conditioner.
//!
//! - [`stats`]: mean/histogram statistics, inversion, grayscale test,
//!   contrast measurement, white balance.
//! - [`blur`]: Gaussian kernels and separable / direct 2D smoothing.
//! - [`background`]: low-pass background elimination.
//! - [`rotate`]: page rotation for skew correction.
pub mod background;
pub mod blur;
pub mod rotate;
pub mod stats;

pub use background::eliminate_background;
pub use blur::{gaussian_blur, GaussianKernel, SeparableFilter};
pub use rotate::rotate;
pub use stats::{
    brightness_histogram, invert, is_grayscale, is_inverted, measure_contrast, white_balance,
};
