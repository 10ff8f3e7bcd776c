//! Output model of the structural engine: regions, blocks, lines, words and
//! table cells. All coordinates are page pixels at the analysis DPI.
use crate::geometry::{BoundingBox, Rect};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    pub rect: Rect,
    /// Pixel row of the baseline, if one could be located.
    pub baseline: Option<usize>,
    pub bold: bool,
    pub italics: bool,
}

impl Word {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            baseline: None,
            bold: false,
            italics: false,
        }
    }

    pub fn bbox(&self) -> Option<BoundingBox> {
        self.rect.to_bbox()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    pub rect: Rect,
    pub words: Vec<Word>,
    /// Estimated point size; `None` until fonts are analysed or when the
    /// line carries too little evidence.
    pub font_size: Option<f32>,
}

impl Line {
    /// Line whose bounds are the hull of `words`.
    pub fn from_words(words: Vec<Word>) -> Self {
        let rect = Rect::hull_all(words.iter().map(|w| &w.rect)).unwrap_or_default();
        Self {
            rect,
            words,
            font_size: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Mean of the known word baselines.
    pub fn baseline(&self) -> Option<f32> {
        let known: Vec<f32> = self
            .words
            .iter()
            .filter_map(|w| w.baseline.map(|b| b as f32))
            .collect();
        (!known.is_empty()).then(|| known.iter().sum::<f32>() / known.len() as f32)
    }

    pub fn translate(&mut self, dx: usize, dy: usize) {
        self.rect = self.rect.translate(dx, dy);
        for w in &mut self.words {
            w.rect = w.rect.translate(dx, dy);
            w.baseline = w.baseline.map(|b| b + dy);
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCell {
    pub rect: Rect,
    pub col_span: usize,
    pub row_span: usize,
    pub lines: Vec<Line>,
}

impl TableCell {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            col_span: 1,
            row_span: 1,
            lines: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

/// Content of an atomic region: lines of text, or rows of a table.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub lines: Vec<Line>,
    pub rows: Vec<TableRow>,
    pub is_table: bool,
}

impl Block {
    pub fn text(lines: Vec<Line>) -> Self {
        Self {
            lines,
            ..Self::default()
        }
    }

    pub fn table(rows: Vec<TableRow>) -> Self {
        Self {
            lines: Vec::new(),
            rows,
            is_table: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.rows.is_empty()
    }

    /// Every line of the block, including those inside table cells.
    pub fn all_lines(&self) -> impl Iterator<Item = &Line> {
        self.lines.iter().chain(
            self.rows
                .iter()
                .flat_map(|r| r.cells.iter().flat_map(|c| c.lines.iter())),
        )
    }

    pub fn all_lines_mut(&mut self) -> impl Iterator<Item = &mut Line> {
        self.lines.iter_mut().chain(
            self.rows
                .iter_mut()
                .flat_map(|r| r.cells.iter_mut().flat_map(|c| c.lines.iter_mut())),
        )
    }

    pub fn word_count(&self) -> usize {
        self.all_lines().map(|l| l.words.len()).sum()
    }
}

/// Node of the region tree.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub rect: Rect,
    /// Produced by a column split of its parent.
    pub is_column: bool,
    pub is_atomic: bool,
    pub children: Vec<Region>,
    pub block: Option<Block>,
}

impl Region {
    pub fn atomic(rect: Rect, is_column: bool) -> Self {
        Self {
            rect,
            is_column,
            is_atomic: true,
            children: Vec::new(),
            block: None,
        }
    }

    pub fn bbox(&self) -> Option<BoundingBox> {
        self.rect.to_bbox()
    }

    /// Atomic leaves in reading order (depth first).
    pub fn leaves(&self) -> Vec<&Region> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(r) = stack.pop() {
            if r.children.is_empty() {
                out.push(r);
            } else {
                stack.extend(r.children.iter().rev());
            }
        }
        out
    }

    pub fn leaves_mut(&mut self) -> Vec<&mut Region> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(r) = stack.pop() {
            if r.children.is_empty() {
                out.push(r);
            } else {
                stack.extend(r.children.iter_mut().rev());
            }
        }
        out
    }

    /// Number of nodes in the subtree.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Region::count).sum::<usize>()
    }

    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(Region::depth).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_hull_and_baseline() {
        let mut a = Word::new(Rect::new(0, 10, 5, 20));
        a.baseline = Some(18);
        let mut b = Word::new(Rect::new(14, 30, 3, 22));
        b.baseline = Some(19);
        let c = Word::new(Rect::new(34, 40, 6, 20));
        let line = Line::from_words(vec![a, b, c]);
        assert_eq!(line.rect, Rect::new(0, 40, 3, 22));
        assert_eq!(line.baseline(), Some(18.5));
        assert_eq!(Line::from_words(Vec::new()).baseline(), None);
    }

    #[test]
    fn empty_block_has_neither_lines_nor_rows() {
        assert!(Block::default().is_empty());
        let table = Block::table(vec![TableRow {
            cells: vec![TableCell::new(Rect::new(0, 5, 0, 5))],
        }]);
        assert!(!table.is_empty());
        assert!(table.is_table);
        assert_eq!(table.word_count(), 0);
    }

    #[test]
    fn leaves_follow_reading_order() {
        let mut root = Region::atomic(Rect::new(0, 100, 0, 100), false);
        root.is_atomic = false;
        root.children = vec![
            Region::atomic(Rect::new(0, 40, 0, 100), true),
            Region::atomic(Rect::new(60, 100, 0, 100), true),
        ];
        let leaves = root.leaves();
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[0].rect.left, 0);
        assert_eq!(root.count(), 3);
        assert_eq!(root.depth(), 2);
    }
}
