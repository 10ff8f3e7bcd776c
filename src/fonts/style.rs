//! Bold and italic probes.
use crate::geometry::Rect;
use crate::image::BrightnessGrid;
use crate::split::shear_offsets;

/// Fraction of glyph columns covered by at least one `side × side` square
/// of pixels darker than `dark`.
pub fn bold_coverage(grid: &BrightnessGrid, glyphs: &[Rect], side: usize, dark: u8) -> f32 {
    let total: usize = glyphs.iter().map(Rect::width).sum();
    if total == 0 || side == 0 {
        return 0.0;
    }
    let covered: usize = glyphs.iter().map(|g| covered_columns(grid, g, side, dark)).sum();
    covered as f32 / total as f32
}

fn covered_columns(grid: &BrightnessGrid, r: &Rect, side: usize, dark: u8) -> usize {
    let (w, h) = (r.width(), r.height());
    if w < side || h < side {
        return 0;
    }
    // summed-area table of dark pixels
    let mut sat = vec![0u32; (w + 1) * (h + 1)];
    for y in 0..h {
        let mut row_sum = 0;
        for x in 0..w {
            row_sum += (grid.get(r.left + x, r.top + y) < dark) as u32;
            sat[(y + 1) * (w + 1) + x + 1] = sat[y * (w + 1) + x + 1] + row_sum;
        }
    }
    let full = (side * side) as u32;
    let mut covered = vec![false; w];
    for y in 0..=h - side {
        for x in 0..=w - side {
            let (x1, y1) = (x + side, y + side);
            let sum = sat[y1 * (w + 1) + x1] + sat[y * (w + 1) + x]
                - sat[y * (w + 1) + x1]
                - sat[y1 * (w + 1) + x];
            if sum == full {
                covered[x..x1].iter_mut().for_each(|c| *c = true);
            }
        }
    }
    covered.iter().filter(|&&c| c).count()
}

/// Sampling paths through the middle half of `rect`, one per column, that
/// are entirely darker than `dark`. A negative `shear_degrees` leans the
/// path to the right going up, like italic strokes.
pub fn stroke_count(grid: &BrightnessGrid, rect: &Rect, shear_degrees: f32, dark: u8) -> usize {
    let h = rect.height();
    let (top, bottom) = (rect.top + h / 4, rect.top + (3 * h) / 4);
    if bottom <= top + 2 {
        return 0;
    }
    let offsets = shear_offsets(bottom - top, shear_degrees);
    (rect.left..rect.right)
        .filter(|&x| {
            (top..bottom).zip(&offsets).all(|(y, &off)| {
                let q = x as isize + off;
                q >= rect.left as isize && q < rect.right as isize && grid.get(q as usize, y) < dark
            })
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paint(g: &mut BrightnessGrid, r: Rect) {
        for y in r.top..r.bottom {
            for x in r.left..r.right {
                g.set(x, y, 0);
            }
        }
    }

    #[test]
    fn thick_strokes_are_covered_thin_ones_not() {
        let mut g = BrightnessGrid::new(100, 40);
        let thick: Vec<Rect> = (0..3).map(|i| Rect::new(i * 10, i * 10 + 6, 5, 35)).collect();
        let thin: Vec<Rect> = (0..3).map(|i| Rect::new(50 + i * 10, 52 + i * 10, 5, 35)).collect();
        for r in thick.iter().chain(&thin) {
            paint(&mut g, *r);
        }
        assert_eq!(bold_coverage(&g, &thick, 4, 64), 1.0);
        assert_eq!(bold_coverage(&g, &thin, 4, 64), 0.0);
    }

    #[test]
    fn slanted_strokes_match_the_italic_shear() {
        let mut g = BrightnessGrid::new(80, 40);
        let mut upright = BrightnessGrid::new(80, 40);
        for k in 0..4 {
            let x0 = 4 + k * 16;
            for y in 0..40 {
                let shift = (40 - y) / 4;
                for x in x0 + shift..x0 + shift + 3 {
                    g.set(x, y, 0);
                }
            }
            paint(&mut upright, Rect::new(x0 + 5, x0 + 8, 0, 40));
        }
        let rect = Rect::new(0, 80, 0, 40);
        assert_eq!(stroke_count(&g, &rect, 0.0, 64), 0);
        assert_eq!(stroke_count(&g, &rect, -15.0, 64), 8);
        assert_eq!(stroke_count(&upright, &rect, 0.0, 64), 12);
        assert_eq!(stroke_count(&upright, &rect, -15.0, 64), 0);
    }
}
