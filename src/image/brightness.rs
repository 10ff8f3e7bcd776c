//! Quantized brightness grid, the working representation of every filter.
//!
//! Pixels are stored as 7-bit brightness (`0..=127`) where [`WHITE`] marks
//! background. All conditioning filters mutate a grid in place; anything
//! derived from a grid (labels, spectra, split results) is stale after such
//! a mutation and must be recomputed.
use super::traits::{ImageView, ImageViewMut};
use super::u8::ImageU8;
use image::{GrayImage, Luma};

/// Brightness of background pixels.
pub const WHITE: u8 = 127;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrightnessGrid {
    w: usize,
    h: usize,
    data: Vec<u8>,
}

impl BrightnessGrid {
    /// All-white grid of size `w × h`.
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            data: vec![WHITE; w * h],
        }
    }

    /// Wrap raw brightness samples; values above [`WHITE`] are clamped.
    pub fn from_raw(w: usize, h: usize, mut data: Vec<u8>) -> Self {
        assert_eq!(data.len(), w * h, "brightness buffer does not match {w}x{h}");
        for v in &mut data {
            *v = (*v).min(WHITE);
        }
        Self { w, h, data }
    }

    /// Quantize an 8-bit luminance view (255 = white) to 7 bits.
    pub fn from_luma(gray: &ImageU8<'_>) -> Self {
        let mut data = Vec::with_capacity(gray.w * gray.h);
        for row in gray.rows() {
            data.extend(row.iter().map(|&v| v >> 1));
        }
        Self {
            w: gray.w,
            h: gray.h,
            data,
        }
    }

    pub fn from_gray_image(img: &GrayImage) -> Self {
        let (w, h) = (img.width() as usize, img.height() as usize);
        Self::from_luma(&ImageU8::packed(w, h, img.as_raw()))
    }

    /// Expand back to 8-bit luminance, mapping [`WHITE`] to 255.
    pub fn to_gray_image(&self) -> GrayImage {
        let mut out = GrayImage::new(self.w as u32, self.h as u32);
        for (i, &v) in self.data.iter().enumerate() {
            let luma = ((v as u32 * 255 + WHITE as u32 / 2) / WHITE as u32) as u8;
            out.put_pixel((i % self.w) as u32, (i / self.w) as u32, Luma([luma]));
        }
        out
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.w
    }
    #[inline]
    pub fn height(&self) -> usize {
        self.h
    }
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.w + x]
    }
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: u8) {
        self.data[y * self.w + x] = v.min(WHITE);
    }
    /// `WHITE - brightness`, i.e. 0 on background.
    #[inline]
    pub fn darkness(&self, x: usize, y: usize) -> u32 {
        (WHITE - self.get(x, y)) as u32
    }
    #[inline]
    pub fn is_white(&self, x: usize, y: usize) -> bool {
        self.get(x, y) >= WHITE
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    pub fn as_raw_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            return WHITE as f64;
        }
        self.data.iter().map(|&v| v as u64).sum::<u64>() as f64 / self.data.len() as f64
    }

    /// Copy of the `w × h` window at `(x0, y0)`.
    pub fn crop(&self, x0: usize, y0: usize, w: usize, h: usize) -> Self {
        assert!(x0 + w <= self.w && y0 + h <= self.h, "crop outside grid");
        let mut data = Vec::with_capacity(w * h);
        for y in y0..y0 + h {
            data.extend_from_slice(&self.row(y)[x0..x0 + w]);
        }
        Self { w, h, data }
    }
}

impl ImageView for BrightnessGrid {
    type Pixel = u8;

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
    fn row(&self, y: usize) -> &[u8] {
        let start = y * self.w;
        &self.data[start..start + self.w]
    }
}

impl ImageViewMut for BrightnessGrid {
    #[inline]
    fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let start = y * self.w;
        &mut self.data[start..start + self.w]
    }
}
