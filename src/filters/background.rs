//! Background elimination by low-pass division.
//!
//! The local background is estimated by a wide Gaussian; every pixel is then
//! rescaled by `brightness / background` so uneven illumination and paper
//! tint flatten to white while ink stays dark. The wide blur runs on a
//! block-averaged copy and is sampled back bilinearly.
use super::blur::gaussian_blur_f32;
use crate::image::{BrightnessGrid, ImageF32, ImageView, ImageViewMut, WHITE};

/// Blur radius, in downsampled pixels, below which no downsampling is done.
const DOWNSAMPLE_TARGET_RADIUS: f32 = 4.0;

/// Block-mean downsample by an integer factor.
fn downsample_mean(grid: &BrightnessGrid, factor: usize) -> ImageF32 {
    let (w, h) = (grid.width(), grid.height());
    let (dw, dh) = (w.div_ceil(factor), h.div_ceil(factor));
    let mut sums = ImageF32::new(dw, dh);
    let mut counts = vec![0u32; dw * dh];
    for y in 0..h {
        let row = grid.row(y);
        let dy = y / factor;
        let dst = sums.row_mut(dy);
        for (x, &v) in row.iter().enumerate() {
            dst[x / factor] += v as f32;
            counts[dy * dw + x / factor] += 1;
        }
    }
    for (s, &c) in sums.data.iter_mut().zip(&counts) {
        *s /= c.max(1) as f32;
    }
    sums
}

fn sample_bilinear(img: &ImageF32, x: f32, y: f32) -> f32 {
    let fx = x.clamp(0.0, (img.w - 1) as f32);
    let fy = y.clamp(0.0, (img.h - 1) as f32);
    let (x0, y0) = (fx.floor() as usize, fy.floor() as usize);
    let (x1, y1) = ((x0 + 1).min(img.w - 1), (y0 + 1).min(img.h - 1));
    let (ax, ay) = (fx - x0 as f32, fy - y0 as f32);
    let top = img.get(x0, y0) * (1.0 - ax) + img.get(x1, y0) * ax;
    let bottom = img.get(x0, y1) * (1.0 - ax) + img.get(x1, y1) * ax;
    top * (1.0 - ay) + bottom * ay
}

/// Low-pass estimate of the page background at full resolution.
pub fn estimate_background(grid: &BrightnessGrid, radius: f32) -> ImageF32 {
    let (w, h) = (grid.width(), grid.height());
    if w == 0 || h == 0 {
        return ImageF32::new(w, h);
    }
    let factor = ((radius / DOWNSAMPLE_TARGET_RADIUS).floor() as usize).max(1);
    let small = downsample_mean(grid, factor);
    let r = radius / factor as f32;
    let blurred = gaussian_blur_f32(&small, r, r, false);
    if factor == 1 {
        return blurred;
    }
    let mut out = ImageF32::new(w, h);
    let inv = 1.0 / factor as f32;
    for y in 0..h {
        let sy = (y as f32 + 0.5) * inv - 0.5;
        let dst = out.row_mut(y);
        for (x, px) in dst.iter_mut().enumerate() {
            let sx = (x as f32 + 0.5) * inv - 0.5;
            *px = sample_bilinear(&blurred, sx, sy);
        }
    }
    out
}

/// Rescale each pixel by its local background brightness, capped at white.
pub fn eliminate_background(grid: &mut BrightnessGrid, radius: f32) {
    if grid.is_empty() || radius <= 0.0 {
        return;
    }
    let background = estimate_background(grid, radius);
    for (v, &bg) in grid.as_raw_mut().iter_mut().zip(&background.data) {
        let scaled = WHITE as f32 * *v as f32 / bg.max(1.0);
        *v = scaled.round().clamp(0.0, WHITE as f32) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uneven_illumination_flattens_to_white() {
        // background fades from 127 to ~80 left to right, with a dark stroke
        let (w, h) = (120usize, 60usize);
        let mut data = Vec::with_capacity(w * h);
        for _y in 0..h {
            for x in 0..w {
                data.push((127 - (x * 47 / w)) as u8);
            }
        }
        let mut g = BrightnessGrid::from_raw(w, h, data);
        for y in 20..40 {
            g.set(100, y, 10);
        }
        eliminate_background(&mut g, 12.0);
        assert!(g.get(110, 5) >= 120, "paper should be near white: {}", g.get(110, 5));
        assert!(g.get(100, 30) < 40, "ink should stay dark: {}", g.get(100, 30));
    }

    #[test]
    fn blank_page_is_untouched() {
        let mut g = BrightnessGrid::new(40, 40);
        eliminate_background(&mut g, 20.0);
        assert!(g.as_raw().iter().all(|&v| v == WHITE));
    }
}
