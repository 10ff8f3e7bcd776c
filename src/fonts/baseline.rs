//! Baselines and glyph heights.
use crate::geometry::{Rect, RectView};
use crate::image::{BrightnessGrid, ImageView, WHITE};
use crate::split::{split_columns, SplitOptions};

fn row_darkness(grid: &BrightnessGrid, rect: &Rect, y: usize) -> u32 {
    grid.row(y)[rect.left..rect.right]
        .iter()
        .map(|&v| (WHITE - v) as u32)
        .sum()
}

/// Row in the lower half of `rect` after which darkness falls the most.
/// Rows below `rect` count as white.
pub fn find_baseline(grid: &BrightnessGrid, rect: &Rect) -> Option<usize> {
    if rect.is_empty() {
        return None;
    }
    let from = rect.top + rect.height() / 2;
    let mut best: Option<(usize, i64)> = None;
    for y in from..rect.bottom {
        let here = row_darkness(grid, rect, y) as i64;
        let below = if y + 1 < rect.bottom {
            row_darkness(grid, rect, y + 1) as i64
        } else {
            0
        };
        let drop = here - below;
        if drop > 0 && best.map_or(true, |(_, d)| drop > d) {
            best = Some((y, drop));
        }
    }
    best.map(|(y, _)| y)
}

/// Glyphs of a word: column pieces separated by at least one white column.
pub fn glyphs<'g>(grid: &'g BrightnessGrid, rect: &Rect) -> Vec<RectView<'g>> {
    let view = RectView::new(grid, *rect);
    match view.trimmed() {
        Some(v) => split_columns(&v, &SplitOptions::with_margin(1)),
        None => Vec::new(),
    }
}

/// Height of a glyph above (and including) the baseline row, and below it.
pub fn ascent_descent(glyph: &Rect, baseline: usize) -> (usize, usize) {
    let ascent = (baseline + 1).saturating_sub(glyph.top);
    let descent = glyph.bottom.saturating_sub(baseline + 1);
    (ascent, descent)
}
