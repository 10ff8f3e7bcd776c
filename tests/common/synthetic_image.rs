//! Synthetic pages for the integration tests.
use page_segmenter::image::{BrightnessGrid, WHITE};
use page_segmenter::Rect;

pub fn blank(width: usize, height: usize) -> BrightnessGrid {
    BrightnessGrid::new(width, height)
}

pub fn fill(grid: &mut BrightnessGrid, r: Rect, value: u8) {
    for y in r.top..r.bottom {
        for x in r.left..r.right {
            grid.set(x, y, value);
        }
    }
}

/// White canvas with one black `side × side` square in the middle.
pub fn centered_square(canvas: usize, side: usize) -> (BrightnessGrid, Rect) {
    let mut g = blank(canvas, canvas);
    let lo = (canvas - side) / 2;
    let r = Rect::new(lo, lo + side, lo, lo + side);
    fill(&mut g, r, 0);
    (g, r)
}

/// `rows × cols` ruled grid of `cw × ch` cells with 2px rules and one short
/// text blob per cell, inside a 10px white margin.
pub fn ruled_table(rows: usize, cols: usize, cw: usize, ch: usize) -> BrightnessGrid {
    let (w, h) = (cols * cw + 2, rows * ch + 2);
    let mut g = blank(w + 20, h + 20);
    for i in 0..=rows {
        fill(&mut g, Rect::new(10, 10 + w, 10 + i * ch, 12 + i * ch), 0);
    }
    for j in 0..=cols {
        fill(&mut g, Rect::new(10 + j * cw, 12 + j * cw, 10, 10 + h), 0);
    }
    for i in 0..rows {
        for j in 0..cols {
            let (x, y) = (10 + j * cw + 12, 10 + i * ch + 14);
            fill(&mut g, Rect::new(x, x + 20, y, y + 8), 0);
        }
    }
    g
}

/// Text-like block: `lines × words` words of five 8×20 glyphs, 2px letter
/// gaps, 12px word gaps, 35px line pitch.
pub fn text_block(grid: &mut BrightnessGrid, left: usize, top: usize, lines: usize, words: usize) {
    for l in 0..lines {
        let y = top + l * 35;
        for w in 0..words {
            for c in 0..5 {
                let x = left + w * 60 + c * 10;
                fill(grid, Rect::new(x, x + 8, y, y + 20), 0);
            }
        }
    }
}

/// Salt-and-pepper page from a fixed linear congruential sequence.
pub fn noise(width: usize, height: usize, seed: u64) -> BrightnessGrid {
    let mut state = seed;
    let data = (0..width * height)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            if (state >> 33) & 1 == 0 {
                0
            } else {
                WHITE
            }
        })
        .collect();
    BrightnessGrid::from_raw(width, height, data)
}
