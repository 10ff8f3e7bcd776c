//! Owned single-channel f32 scratch buffer in row-major layout.
//!
//! Filters run their intermediate passes in float to avoid compounding
//! rounding on the 7-bit brightness scale, then quantize back into a
//! [`BrightnessGrid`] with clamping to `[0, 127]`.
use super::brightness::{BrightnessGrid, WHITE};

#[derive(Clone, Debug)]
pub struct ImageF32 {
    /// Image width in pixels
    pub w: usize,
    /// Image height in pixels
    pub h: usize,
    /// Backing storage in row-major order (`stride == w`)
    pub data: Vec<f32>,
}

impl ImageF32 {
    /// Construct a zero-initialized buffer of size `w × h`.
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            data: vec![0.0; w * h],
        }
    }

    /// Lift a brightness grid into float samples on the same 0..=127 scale.
    pub fn from_brightness(grid: &BrightnessGrid) -> Self {
        Self {
            w: grid.width(),
            h: grid.height(),
            data: grid.as_raw().iter().map(|&v| v as f32).collect(),
        }
    }

    /// Round and clamp every sample into a brightness grid.
    pub fn to_brightness(&self) -> BrightnessGrid {
        let data = self
            .data
            .iter()
            .map(|&v| v.round().clamp(0.0, WHITE as f32) as u8)
            .collect();
        BrightnessGrid::from_raw(self.w, self.h, data)
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.w + x
    }
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[self.idx(x, y)]
    }
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: f32) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }
}

impl crate::image::traits::ImageView for ImageF32 {
    type Pixel = f32;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn stride(&self) -> usize {
        self.w
    }
    #[inline]
    fn row(&self, y: usize) -> &[f32] {
        let start = y * self.w;
        &self.data[start..start + self.w]
    }
}

impl crate::image::traits::ImageViewMut for ImageF32 {
    #[inline]
    fn row_mut(&mut self, y: usize) -> &mut [f32] {
        let start = y * self.w;
        &mut self.data[start..start + self.w]
    }
}
