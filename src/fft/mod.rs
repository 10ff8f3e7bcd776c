//! Radix-2 FFT over brightness grids, used only for page skew estimation.
//!
//! - [`compute_fft`]: recursive Cooley–Tukey on a power-of-two length.
//! - [`fft_2d`]: in-place 2D transform (columns, then rows).
//! - [`get_fft`]: aggregate a page into a `dim_x × dim_y` darkness grid,
//!   optionally tiling it, transform it and zero the DC term.
//! - [`skew`]: rotation estimate from the dominant spectral peaks.
//!
//! Recursion depth is `log2(len)`, bounded by the spectrum dimensions.
pub mod skew;

use crate::image::{BrightnessGrid, ImageView};
use nalgebra::Complex;
use std::f64::consts::PI;

pub use skew::{MagnitudeAdjust, SkewEstimator};

/// Discrete Fourier transform of `samples` (`e^{-2πik/N}` convention).
///
/// Panics if the length is not a power of two.
pub fn compute_fft(samples: &[Complex<f64>]) -> Vec<Complex<f64>> {
    let n = samples.len();
    assert!(
        n.is_power_of_two(),
        "FFT length {n} is not a power of two"
    );
    if n == 1 {
        return samples.to_vec();
    }
    let even: Vec<Complex<f64>> = samples.iter().step_by(2).copied().collect();
    let odd: Vec<Complex<f64>> = samples.iter().skip(1).step_by(2).copied().collect();
    let even = compute_fft(&even);
    let odd = compute_fft(&odd);
    let half = n / 2;
    let mut out = vec![Complex::new(0.0, 0.0); n];
    for k in 0..half {
        let twiddle = Complex::from_polar(1.0, -2.0 * PI * k as f64 / n as f64) * odd[k];
        out[k] = even[k] + twiddle;
        out[k + half] = even[k] - twiddle;
    }
    out
}

/// In-place 2D FFT of a row-major `dim_x × dim_y` grid.
pub fn fft_2d(data: &mut [Complex<f64>], dim_x: usize, dim_y: usize) {
    assert_eq!(data.len(), dim_x * dim_y, "spectrum buffer size mismatch");
    let mut column = vec![Complex::new(0.0, 0.0); dim_y];
    for x in 0..dim_x {
        for (y, c) in column.iter_mut().enumerate() {
            *c = data[y * dim_x + x];
        }
        for (y, v) in compute_fft(&column).into_iter().enumerate() {
            data[y * dim_x + x] = v;
        }
    }
    for y in 0..dim_y {
        let row = &mut data[y * dim_x..(y + 1) * dim_x];
        let transformed = compute_fft(row);
        row.copy_from_slice(&transformed);
    }
}

/// Complex spectrum of a page, DC term removed.
#[derive(Clone, Debug)]
pub struct Spectrum {
    pub dim_x: usize,
    pub dim_y: usize,
    pub data: Vec<Complex<f64>>,
}

impl Spectrum {
    #[inline]
    pub fn magnitude(&self, i: usize, j: usize) -> f64 {
        self.data[j * self.dim_x + i].norm()
    }

    /// Signed frequency of bin `(i, j)` in cycles per grid cell.
    pub fn frequency(&self, i: usize, j: usize) -> (f64, f64) {
        let signed = |k: usize, n: usize| {
            if k < n.div_ceil(2) {
                k as f64
            } else {
                k as f64 - n as f64
            }
        };
        (
            signed(i, self.dim_x) / self.dim_x as f64,
            signed(j, self.dim_y) / self.dim_y as f64,
        )
    }
}

/// Downsample `grid` into a `dim_x × dim_y` darkness grid and transform it.
///
/// Each cell averages the darkness of a square block of pixels, the block
/// size chosen so the whole page fits. With `repeat` the page is tiled over
/// the unused cells instead of padding them with white.
pub fn get_fft(grid: &BrightnessGrid, dim_x: usize, dim_y: usize, repeat: bool) -> Spectrum {
    let mut data = vec![Complex::new(0.0, 0.0); dim_x * dim_y];
    let (w, h) = (grid.width(), grid.height());
    if w > 0 && h > 0 && !data.is_empty() {
        let scale = w.div_ceil(dim_x).max(h.div_ceil(dim_y)).max(1);
        let (cells_x, cells_y) = (w.div_ceil(scale), h.div_ceil(scale));
        let mut sums = vec![0.0f64; cells_x * cells_y];
        let mut counts = vec![0u32; cells_x * cells_y];
        for y in 0..h {
            let row = grid.row(y);
            let cy = y / scale;
            for (x, &v) in row.iter().enumerate() {
                let idx = cy * cells_x + x / scale;
                sums[idx] += (crate::image::WHITE - v) as f64;
                counts[idx] += 1;
            }
        }
        for j in 0..dim_y {
            for i in 0..dim_x {
                let (ci, cj) = if repeat {
                    (i % cells_x, j % cells_y)
                } else if i < cells_x && j < cells_y {
                    (i, j)
                } else {
                    continue;
                };
                let idx = cj * cells_x + ci;
                data[j * dim_x + i] = Complex::new(sums[idx] / counts[idx].max(1) as f64, 0.0);
            }
        }
    }
    fft_2d(&mut data, dim_x, dim_y);
    if let Some(dc) = data.first_mut() {
        *dc = Complex::new(0.0, 0.0);
    }
    Spectrum { dim_x, dim_y, data }
}
