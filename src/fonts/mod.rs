//! Typographic metadata for segmented lines: baselines, point size, bold
//! and italics.
//!
//! The calibration constants (`107` for cap height, `155` for x-height, the
//! bold probe size, the 15° italic shear) were tuned against printed body
//! text; they are configurable but should only change with fresh
//! validation data.
pub mod baseline;
pub mod style;

pub use baseline::{ascent_descent, find_baseline, glyphs};
pub use style::{bold_coverage, stroke_count};

use crate::geometry::Rect;
use crate::image::BrightnessGrid;
use crate::layout::{Block, Line};
use log::debug;
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct FontOptions {
    /// Ascents at or above this fraction of the tallest are capitals.
    pub cap_cutoff: f32,
    /// `points = cap_height × cap_height_factor / dpi`.
    pub cap_height_factor: f32,
    /// `points = x_height × x_height_factor / dpi`.
    pub x_height_factor: f32,
    /// Bold probe side as a fraction of the em size in pixels.
    pub bold_probe_fraction: f32,
    pub bold_min_side: usize,
    /// Pixels darker than this count as stroke ink.
    pub stroke_dark: u8,
    /// Share of glyph width that must hold probe squares for bold.
    pub bold_min_coverage: f32,
    pub italic_shear_degrees: f32,
    /// Italic when `sheared > italic_ratio × upright + italic_offset`.
    pub italic_ratio: f32,
    pub italic_offset: f32,
    /// Words narrower than this `width / height` inherit style from
    /// neighbours instead of being judged.
    pub min_judge_aspect: f32,
}

impl Default for FontOptions {
    fn default() -> Self {
        Self {
            cap_cutoff: 0.8,
            cap_height_factor: 107.0,
            x_height_factor: 155.0,
            bold_probe_fraction: 0.1,
            bold_min_side: 2,
            stroke_dark: 64,
            bold_min_coverage: 0.5,
            italic_shear_degrees: 15.0,
            italic_ratio: 1.5,
            italic_offset: 1.0,
            min_judge_aspect: 1.5,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct FontMetricsAnalyzer {
    pub options: FontOptions,
}

impl FontMetricsAnalyzer {
    pub fn new(options: FontOptions) -> Self {
        Self { options }
    }

    pub fn analyze_block(&self, grid: &BrightnessGrid, block: &mut Block, dpi: f32) {
        for line in block.all_lines_mut() {
            self.analyze_line(grid, line, dpi);
        }
    }

    /// Fill in word baselines, the line's point size and word styles.
    pub fn analyze_line(&self, grid: &BrightnessGrid, line: &mut Line, dpi: f32) {
        let opts = &self.options;
        for word in &mut line.words {
            word.baseline = find_baseline(grid, &word.rect);
        }
        let word_glyphs: Vec<Vec<Rect>> = line
            .words
            .iter()
            .map(|w| glyphs(grid, &w.rect).into_iter().map(|g| g.rect).collect())
            .collect();
        line.font_size = self.point_size(line, &word_glyphs, dpi);

        let mut judged = vec![false; line.words.len()];
        for (i, word) in line.words.iter_mut().enumerate() {
            let r = word.rect;
            if r.height() == 0 || (r.width() as f32 / r.height() as f32) < opts.min_judge_aspect {
                continue;
            }
            let points = line
                .font_size
                .unwrap_or(r.height() as f32 * opts.cap_height_factor / dpi);
            let em = points / 72.0 * dpi;
            let side = ((em * opts.bold_probe_fraction).round() as usize).max(opts.bold_min_side);
            word.bold = bold_coverage(grid, &word_glyphs[i], side, opts.stroke_dark) > opts.bold_min_coverage;
            let upright = stroke_count(grid, &r, 0.0, opts.stroke_dark) as f32;
            let sheared = stroke_count(grid, &r, -opts.italic_shear_degrees, opts.stroke_dark) as f32;
            word.italics = sheared > opts.italic_ratio * upright + opts.italic_offset;
            judged[i] = true;
        }
        inherit_styles(line, &judged);
        debug!(
            "FontMetricsAnalyzer line {:?} size={:?} baseline={:?}",
            line.rect,
            line.font_size,
            line.baseline()
        );
    }

    /// Point size from the line's glyph ascents, split into capitals and
    /// lowercase at [`FontOptions::cap_cutoff`] of the tallest.
    pub fn point_size(&self, line: &Line, word_glyphs: &[Vec<Rect>], dpi: f32) -> Option<f32> {
        let opts = &self.options;
        let ascents: Vec<usize> = line
            .words
            .iter()
            .zip(word_glyphs)
            .filter_map(|(w, gl)| w.baseline.map(|b| (b, gl)))
            .flat_map(|(b, gl)| gl.iter().map(move |g| ascent_descent(g, b).0))
            .filter(|&a| a > 0)
            .collect();
        let max = *ascents.iter().max()? as f32;
        let cutoff = max * opts.cap_cutoff;
        let heights = ascents.iter().map(|&a| a as f32);
        let cap = mean(heights.clone().filter(|&a| a >= cutoff)).map(|c| c * opts.cap_height_factor / dpi);
        let x = mean(heights.filter(|&a| a < cutoff)).map(|x| x * opts.x_height_factor / dpi);
        match (cap, x) {
            (Some(c), Some(x)) => Some((c + x) * 0.5),
            (c, x) => c.or(x),
        }
    }
}

fn mean(values: impl Iterator<Item = f32>) -> Option<f32> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f32)
}

/// Words too narrow to judge copy the style of the nearest judged word,
/// looking left first.
fn inherit_styles(line: &mut Line, judged: &[bool]) {
    for i in 0..line.words.len() {
        if judged[i] {
            continue;
        }
        let donor = (0..i)
            .rev()
            .find(|&j| judged[j])
            .or_else(|| (i + 1..line.words.len()).find(|&j| judged[j]));
        if let Some(j) = donor {
            let (bold, italics) = (line.words[j].bold, line.words[j].italics);
            line.words[i].bold = bold;
            line.words[i].italics = italics;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Word;

    fn paint(g: &mut BrightnessGrid, r: Rect) {
        for y in r.top..r.bottom {
            for x in r.left..r.right {
                g.set(x, y, 0);
            }
        }
    }

    #[test]
    fn point_size_from_cap_and_x_heights() {
        let mut g = BrightnessGrid::new(200, 80);
        // capitals 35px tall, lowercase 25px, sharing the baseline at row 49
        for i in 0..6 {
            let top = if i % 2 == 0 { 15 } else { 25 };
            paint(&mut g, Rect::new(10 + i * 14, 20 + i * 14, top, 50));
        }
        let mut line = Line::from_words(vec![Word::new(Rect::new(10, 90, 15, 50))]);
        FontMetricsAnalyzer::default().analyze_line(&g, &mut line, 300.0);
        assert_eq!(line.words[0].baseline, Some(49));
        let expected = (35.0 * 107.0 / 300.0 + 25.0 * 155.0 / 300.0) / 2.0;
        let size = line.font_size.expect("size estimated");
        assert!((size - expected).abs() < 0.05, "size={size} expected={expected}");
    }

    #[test]
    fn bold_word_and_narrow_neighbour_inheriting_it() {
        let mut g = BrightnessGrid::new(300, 60);
        // wide word of heavy strokes
        for i in 0..8 {
            paint(&mut g, Rect::new(10 + i * 12, 10 + i * 12 + 8, 10, 40));
        }
        // single thin stroke, too narrow to judge
        paint(&mut g, Rect::new(150, 152, 10, 40));
        let mut line = Line::from_words(vec![
            Word::new(Rect::new(10, 102, 10, 40)),
            Word::new(Rect::new(150, 152, 10, 40)),
        ]);
        FontMetricsAnalyzer::default().analyze_line(&g, &mut line, 300.0);
        assert!(line.words[0].bold);
        assert!(!line.words[0].italics);
        assert!(line.words[1].bold, "narrow word inherits from its neighbour");
    }

    #[test]
    fn light_word_is_not_bold() {
        let mut g = BrightnessGrid::new(200, 60);
        for i in 0..8 {
            paint(&mut g, Rect::new(10 + i * 12, 12 + i * 12, 10, 40));
        }
        let mut line = Line::from_words(vec![Word::new(Rect::new(10, 96, 10, 40))]);
        FontMetricsAnalyzer::default().analyze_line(&g, &mut line, 300.0);
        assert!(!line.words[0].bold);
    }

    #[test]
    fn empty_line_has_no_size() {
        let g = BrightnessGrid::new(10, 10);
        let mut line = Line::from_words(Vec::new());
        FontMetricsAnalyzer::default().analyze_line(&g, &mut line, 300.0);
        assert_eq!(line.font_size, None);
    }
}
