//! Line and word segmentation of an atomic region.
use super::model::{Block, Line, Word};
use super::tree::px;
use crate::geometry::RectView;
use crate::image::{ImageView, WHITE};
use crate::split::{split_columns, split_rows, SplitOptions};
use log::debug;
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct BlockOptions {
    /// Line split margin is `dpi / line_margin_divisor`.
    pub line_margin_divisor: f32,
    /// Shear tolerance of the line pass (tried as `0, +s, -s`).
    pub line_shear_degrees: f32,
    /// Side-by-side content inside one line band is cut at
    /// `dpi / column_margin_divisor`.
    pub column_margin_divisor: f32,
    /// Lines taller than this multiple of the median are re-split with the
    /// zigzag splitter.
    pub tall_line_factor: f32,
    /// Lines shorter than this fraction of the mean are reattached.
    pub small_line_factor: f32,
    pub zigzag_step: usize,
    /// Word margin is `line height / divisor`, by extender presence.
    pub word_divisor_plain: f32,
    pub word_divisor_ascender: f32,
    pub word_divisor_descender: f32,
    pub word_divisor_both: f32,
    /// Ink this fraction of the line height outside the dense core band
    /// counts as an ascender (above) or descender (below).
    pub extender_fraction: f32,
    /// Fragments below `(dpi / min_fragment_divisor)²` pixels are noise.
    pub min_fragment_divisor: f32,
    /// Fragments larger than this many inches are merge artifacts.
    pub max_fragment_inches: f32,
}

impl Default for BlockOptions {
    fn default() -> Self {
        Self {
            line_margin_divisor: 40.0,
            line_shear_degrees: 0.5,
            column_margin_divisor: 4.0,
            tall_line_factor: 2.0,
            small_line_factor: 0.5,
            zigzag_step: 1,
            word_divisor_plain: 8.0,
            word_divisor_ascender: 11.0,
            word_divisor_descender: 12.0,
            word_divisor_both: 15.0,
            extender_fraction: 0.15,
            min_fragment_divisor: 100.0,
            max_fragment_inches: 2.0,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct BlockStructurer {
    pub options: BlockOptions,
}

impl BlockStructurer {
    pub fn new(options: BlockOptions) -> Self {
        Self { options }
    }

    /// Segment `view` into lines of words. Blank or degenerate views give
    /// an empty block.
    pub fn structure(&self, view: &RectView<'_>, dpi: f32) -> Block {
        let Some(content) = view.trimmed() else {
            return Block::default();
        };
        let lines: Vec<Line> = self
            .split_lines(&content, dpi)
            .iter()
            .filter_map(|line| {
                let words: Vec<Word> = self
                    .split_words(line, dpi)
                    .into_iter()
                    .map(|w| Word::new(w.rect))
                    .collect();
                (!words.is_empty()).then(|| Line::from_words(words))
            })
            .collect();
        debug!(
            "BlockStructurer {:?} lines={} words={}",
            content.rect,
            lines.len(),
            lines.iter().map(|l| l.words.len()).sum::<usize>()
        );
        Block::text(lines)
    }

    /// Line bands of `view`, top to bottom.
    pub fn split_lines<'g>(&self, view: &RectView<'g>, dpi: f32) -> Vec<RectView<'g>> {
        let opts = &self.options;
        let margin = px(dpi / opts.line_margin_divisor);
        let base = SplitOptions::with_margin(margin);
        let s = opts.line_shear_degrees;
        let mut lines = split_rows(view, &base);
        if s != 0.0 {
            for shear in [s, -s] {
                let parts = split_rows(view, &base.clone().with_shear(shear));
                if parts.len() > lines.len() {
                    lines = parts;
                }
            }
        }

        let column_opts = SplitOptions::with_margin(px(dpi / opts.column_margin_divisor));
        let mut lines: Vec<RectView<'g>> = lines
            .iter()
            .flat_map(|l| split_columns(l, &column_opts))
            .collect();

        if let Some(median) = median_height(&lines) {
            let limit = median as f32 * opts.tall_line_factor;
            let zigzag = SplitOptions::with_margin(1).with_zigzag(opts.zigzag_step);
            lines = lines
                .into_iter()
                .flat_map(|l| {
                    if l.height() as f32 > limit {
                        split_rows(&l, &zigzag)
                    } else {
                        vec![l]
                    }
                })
                .collect();
        }
        self.reattach_small(lines)
    }

    /// Fold lines much shorter than average (a clipped accent, the dot of
    /// an i) into the nearest line below that horizontally contains them.
    fn reattach_small<'g>(&self, mut lines: Vec<RectView<'g>>) -> Vec<RectView<'g>> {
        if lines.len() < 2 {
            return lines;
        }
        let mean = lines.iter().map(|l| l.height()).sum::<usize>() as f32 / lines.len() as f32;
        let small_limit = mean * self.options.small_line_factor;
        let mut i = 0;
        while i < lines.len() {
            let small = lines[i];
            if small.height() as f32 >= small_limit {
                i += 1;
                continue;
            }
            let target = lines
                .iter()
                .enumerate()
                .filter(|&(j, l)| {
                    j != i
                        && l.rect.top >= small.rect.bottom
                        && l.rect.left <= small.rect.left
                        && l.rect.right >= small.rect.right
                        && ((l.rect.top - small.rect.bottom) as f32) <= mean
                })
                .min_by_key(|(_, l)| l.rect.top)
                .map(|(j, _)| j);
            match target {
                Some(j) => {
                    let merged = lines[j].rect.hull(&small.rect);
                    lines[j] = lines[j].with_rect(merged);
                    lines.remove(i);
                }
                None => i += 1,
            }
        }
        lines
    }

    /// Words of one line, left to right, with noise and merge artifacts
    /// dropped.
    pub fn split_words<'g>(&self, line: &RectView<'g>, dpi: f32) -> Vec<RectView<'g>> {
        let opts = &self.options;
        let margin = self.word_margin(line);
        let min_side = dpi / opts.min_fragment_divisor;
        let max_side = dpi * opts.max_fragment_inches;
        split_columns(line, &SplitOptions::with_margin(margin))
            .into_iter()
            .filter(|w| {
                let (ww, wh) = (w.width() as f32, w.height() as f32);
                ww * wh >= min_side * min_side && ww <= max_side && wh <= max_side
            })
            .collect()
    }

    /// Adaptive word gap: a fraction of the line height that shrinks when
    /// ascenders or descenders inflate the line relative to its x-height.
    pub fn word_margin(&self, line: &RectView<'_>) -> usize {
        let opts = &self.options;
        let (top, bottom) = (line.rect.top, line.rect.bottom);
        let h = line.height();
        if h == 0 {
            return 1;
        }
        let grid = line.grid();
        let counts: Vec<usize> = (top..bottom)
            .map(|y| {
                grid.row(y)[line.rect.left..line.rect.right]
                    .iter()
                    .filter(|&&v| v < WHITE)
                    .count()
            })
            .collect();
        let peak = counts.iter().copied().max().unwrap_or(0);
        let dense = |c: &usize| *c * 2 >= peak && peak > 0;
        let core_top = counts.iter().position(dense).unwrap_or(0);
        let core_bottom = counts.iter().rposition(dense).map_or(h, |p| p + 1);
        let reach = opts.extender_fraction * h as f32;
        let ascender = core_top as f32 > reach;
        let descender = (h - core_bottom) as f32 > reach;
        let divisor = match (ascender, descender) {
            (false, false) => opts.word_divisor_plain,
            (true, false) => opts.word_divisor_ascender,
            (false, true) => opts.word_divisor_descender,
            (true, true) => opts.word_divisor_both,
        };
        px(h as f32 / divisor)
    }
}

fn median_height(lines: &[RectView<'_>]) -> Option<usize> {
    let mut heights: Vec<usize> = lines.iter().map(|l| l.height()).collect();
    if heights.is_empty() {
        return None;
    }
    heights.sort_unstable();
    Some(heights[heights.len() / 2])
}
