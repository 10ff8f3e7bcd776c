//! Ruled table detection and cell reconstruction.
//!
//! Runs only on blocks that produced no lines: a ruled table glues its
//! content together through the rules, so the line pass sees one oversized
//! fragment and drops it. The detector
//!
//! 1. scans for straight ink runs (horizontal: half the block width,
//!    vertical: a third of its height),
//! 2. clusters matching rows / columns into grid lines,
//! 3. validates the grid (at least two lines per axis, bounded coverage,
//!    outermost lines near the block edges),
//! 4. erases the rules and derives row / column bands between them, adding
//!    content gaps as extra separators on an axis whose rules are incomplete,
//! 5. merges cells across missing rule segments into column / row spans,
//! 6. segments every cell of the erased image into lines and words; cells
//!    without content become empty fillers, so every row covers the full
//!    column count.
mod cluster;
mod scan;

pub use cluster::LineGroup;

use crate::geometry::{Rect, RectView};
use crate::image::{BrightnessGrid, WHITE};
use crate::layout::{BlockStructurer, TableCell, TableRow};
use crate::split::{split, Axis, SplitOptions};
use cluster::{cluster_1d, spacing_range};
use log::debug;
use scan::{matching_cols, matching_rows};
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct TableOptions {
    /// Blocks smaller than this in either dimension are never tables.
    pub min_block_inches: f32,
    /// Horizontal rule runs span at least this fraction of the block width.
    pub horizontal_run_fraction: f32,
    /// Vertical rule runs span at least this fraction of the block height.
    pub vertical_run_fraction: f32,
    /// A gap this wide (millimetres) between matching rows starts a new
    /// grid line.
    pub group_gap_mm: f32,
    /// Rules may cover at most this fraction of the block per axis.
    pub max_coverage: f32,
    /// Outermost rules lie within this fraction of the block size from the
    /// block edges.
    pub edge_fraction: f32,
    /// Pixels darker than this are rule ink.
    pub ink_threshold: u8,
    /// A rule segment counts as present when ink covers this fraction of it.
    pub separator_presence: f32,
    /// Content-gap margin on incomplete axes is `dpi / gap_margin_divisor`.
    pub gap_margin_divisor: f32,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            min_block_inches: 0.5,
            horizontal_run_fraction: 0.5,
            vertical_run_fraction: 1.0 / 3.0,
            group_gap_mm: 0.4,
            max_coverage: 0.3,
            edge_fraction: 0.1,
            ink_threshold: 100,
            separator_presence: 0.5,
            gap_margin_divisor: 20.0,
        }
    }
}

/// Boundary between two bands: a rule (`ruled`) or a content gap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Separator {
    start: usize,
    end: usize,
    ruled: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Band {
    start: usize,
    end: usize,
}

#[derive(Clone, Debug, Default)]
pub struct TableDetector {
    pub options: TableOptions,
}

impl TableDetector {
    pub fn new(options: TableOptions) -> Self {
        Self { options }
    }

    /// Whether a block of this size is worth probing.
    pub fn is_candidate(&self, rect: &Rect, dpi: f32) -> bool {
        let min = dpi * self.options.min_block_inches;
        rect.width() as f32 >= min && rect.height() as f32 >= min
    }

    /// Reconstruct the table in `view`, or `None` when the block is not a
    /// ruled table.
    pub fn detect(&self, view: &RectView<'_>, dpi: f32, structurer: &BlockStructurer) -> Option<Vec<TableRow>> {
        let opts = &self.options;
        let content = view.trimmed()?;
        let r = content.rect;
        if !self.is_candidate(&r, dpi) {
            debug!("TableDetector {:?}: too small", r);
            return None;
        }
        let (w, h) = (r.width(), r.height());
        let min_h_run = (w as f32 * opts.horizontal_run_fraction).ceil() as usize;
        let min_v_run = (h as f32 * opts.vertical_run_fraction).ceil() as usize;
        let eps = ((dpi * opts.group_gap_mm / 25.4).round() as usize).max(1);
        let row_groups = cluster_1d(matching_rows(&content, min_h_run, opts.ink_threshold), eps, 0.0);
        let col_groups = cluster_1d(matching_cols(&content, min_v_run, opts.ink_threshold), eps, 0.0);
        if !self.validate(&row_groups, r.top, r.bottom) || !self.validate(&col_groups, r.left, r.right) {
            debug!(
                "TableDetector {:?}: rejected grid rows={} cols={}",
                r,
                row_groups.len(),
                col_groups.len()
            );
            return None;
        }

        let stripped = strip_rules(content.grid(), &r, &row_groups, &col_groups);
        let local = |band: &Band, axis: Axis| match axis {
            Axis::Rows => Rect::new(0, w, band.start - r.top, band.end - r.top),
            Axis::Columns => Rect::new(band.start - r.left, band.end - r.left, 0, h),
        };
        let gap_margin = ((dpi / opts.gap_margin_divisor).round() as usize).max(1);
        let row_seps = self.separators(&row_groups, &stripped, Axis::Rows, r.top, gap_margin, &local);
        let col_seps = self.separators(&col_groups, &stripped, Axis::Columns, r.left, gap_margin, &local);
        let row_bands = bands(&row_seps);
        let col_bands = bands(&col_seps);
        if row_bands.is_empty() || col_bands.is_empty() {
            return None;
        }

        let (nr, nc) = (row_bands.len(), col_bands.len());
        let ink = opts.ink_threshold;
        let grid = content.grid();
        // rule between col bands c and c+1 within row band rb
        let v_present = |rb: usize, c: usize| {
            let sep = col_seps[c + 1];
            !sep.ruled || {
                let band = row_bands[rb];
                let hits = (band.start..band.end)
                    .filter(|&y| (sep.start..sep.end).any(|x| grid.get(x, y) < ink))
                    .count();
                hits as f32 >= opts.separator_presence * (band.end - band.start) as f32
            }
        };
        // rule between row bands rb and rb+1 within col band c
        let h_present = |rb: usize, c: usize| {
            let sep = row_seps[rb + 1];
            !sep.ruled || {
                let band = col_bands[c];
                let hits = (band.start..band.end)
                    .filter(|&x| (sep.start..sep.end).any(|y| grid.get(x, y) < ink))
                    .count();
                hits as f32 >= opts.separator_presence * (band.end - band.start) as f32
            }
        };

        let stripped_view = RectView::whole(&stripped);
        let mut covered = vec![false; nr * nc];
        let mut rows = Vec::with_capacity(nr);
        for rb in 0..nr {
            let mut cells = Vec::new();
            let mut c = 0;
            while c < nc {
                if covered[rb * nc + c] {
                    c += 1;
                    continue;
                }
                let mut cs = 1;
                while c + cs < nc && !v_present(rb, c + cs - 1) && !covered[rb * nc + c + cs] {
                    cs += 1;
                }
                let mut rs = 1;
                while rb + rs < nr
                    && (c..c + cs).all(|cc| !h_present(rb + rs - 1, cc) && !covered[(rb + rs) * nc + cc])
                {
                    rs += 1;
                }
                for rr in rb..rb + rs {
                    for cc in c..c + cs {
                        covered[rr * nc + cc] = true;
                    }
                }
                let rect = Rect::new(
                    col_bands[c].start,
                    col_bands[c + cs - 1].end,
                    row_bands[rb].start,
                    row_bands[rb + rs - 1].end,
                );
                let mut cell = TableCell::new(rect);
                cell.col_span = cs;
                cell.row_span = rs;
                let local_rect = Rect::new(
                    rect.left - r.left,
                    rect.right - r.left,
                    rect.top - r.top,
                    rect.bottom - r.top,
                );
                let block = structurer.structure(&stripped_view.with_rect(local_rect), dpi);
                cell.lines = block.lines;
                for line in &mut cell.lines {
                    line.translate(r.left, r.top);
                }
                cells.push(cell);
                c += cs;
            }
            rows.push(TableRow { cells });
        }
        pad_rows(&mut rows, &row_bands, &col_bands);
        debug!(
            "TableDetector {:?}: {}x{} bands, {} cells",
            r,
            nr,
            nc,
            rows.iter().map(|row| row.cells.len()).sum::<usize>()
        );
        Some(rows)
    }

    fn validate(&self, groups: &[LineGroup], lo: usize, hi: usize) -> bool {
        let (Some(first), Some(last)) = (groups.first(), groups.last()) else {
            return false;
        };
        if groups.len() < 2 {
            return false;
        }
        let extent = (hi - lo) as f32;
        let covered: usize = groups.iter().map(LineGroup::thickness).sum();
        if covered as f32 > self.options.max_coverage * extent {
            return false;
        }
        let tol = self.options.edge_fraction * extent;
        (first.start - lo) as f32 <= tol && (hi - last.end) as f32 <= tol
    }

    /// Separators along one axis, outer rules included. An axis whose rule
    /// spacing is irregular (or that has no internal rule) is incomplete and
    /// gets extra separators at content gaps inside each band.
    fn separators<F>(
        &self,
        groups: &[LineGroup],
        stripped: &BrightnessGrid,
        axis: Axis,
        origin: usize,
        gap_margin: usize,
        local: &F,
    ) -> Vec<Separator>
    where
        F: Fn(&Band, Axis) -> Rect,
    {
        let ruled: Vec<Separator> = groups
            .iter()
            .map(|g| Separator {
                start: g.start,
                end: g.end,
                ruled: true,
            })
            .collect();
        if is_complete(groups) {
            return ruled;
        }
        let view = RectView::whole(stripped);
        let opts = SplitOptions::with_margin(gap_margin);
        let mut out = Vec::with_capacity(ruled.len());
        for pair in ruled.windows(2) {
            out.push(pair[0]);
            let band = Band {
                start: pair[0].end,
                end: pair[1].start,
            };
            if band.start >= band.end {
                continue;
            }
            let parts = split(&view.with_rect(local(&band, axis)), axis, &opts);
            for w in parts.windows(2) {
                let (a, b) = match axis {
                    Axis::Rows => (w[0].rect.bottom, w[1].rect.top),
                    Axis::Columns => (w[0].rect.right, w[1].rect.left),
                };
                if a < b {
                    out.push(Separator {
                        start: a + origin,
                        end: b + origin,
                        ruled: false,
                    });
                }
            }
        }
        if let Some(last) = ruled.last() {
            out.push(*last);
        }
        out
    }
}

/// Regular rule spacing: the widest gap is no larger than the narrowest
/// times the number of internal rules plus one.
fn is_complete(groups: &[LineGroup]) -> bool {
    let internal = groups.len().saturating_sub(2);
    if internal == 0 {
        return false;
    }
    match spacing_range(groups) {
        Some((min, max)) => max <= min * (internal + 1) as f32,
        None => false,
    }
}

fn bands(seps: &[Separator]) -> Vec<Band> {
    seps.windows(2)
        .filter(|w| w[0].end < w[1].start)
        .map(|w| Band {
            start: w[0].end,
            end: w[1].start,
        })
        .collect()
}

/// Copy of the block with every rule row and column painted white, in
/// block-local coordinates.
fn strip_rules(grid: &BrightnessGrid, r: &Rect, rows: &[LineGroup], cols: &[LineGroup]) -> BrightnessGrid {
    let mut out = grid.crop(r.left, r.top, r.width(), r.height());
    for g in rows {
        for y in g.start..g.end {
            for x in 0..r.width() {
                out.set(x, y - r.top, WHITE);
            }
        }
    }
    for g in cols {
        for x in g.start..g.end {
            for y in 0..r.height() {
                out.set(x - r.left, y, WHITE);
            }
        }
    }
    out
}

/// Append empty cells wherever a row covers fewer column bands than the
/// table has, counting row spans from above.
fn pad_rows(rows: &mut [TableRow], row_bands: &[Band], col_bands: &[Band]) {
    let nc = col_bands.len();
    let mut occupied = vec![vec![false; nc]; rows.len()];
    for (ri, row) in rows.iter().enumerate() {
        for cell in row.cells.iter() {
            let c0 = col_bands
                .iter()
                .position(|b| b.start >= cell.rect.left)
                .unwrap_or(nc);
            for rr in ri..(ri + cell.row_span).min(occupied.len()) {
                for cc in c0..(c0 + cell.col_span).min(nc) {
                    occupied[rr][cc] = true;
                }
            }
        }
    }
    for (ri, row) in rows.iter_mut().enumerate() {
        for (cc, band) in col_bands.iter().enumerate() {
            if !occupied[ri][cc] {
                let rb = row_bands[ri];
                row.cells.push(TableCell::new(Rect::new(band.start, band.end, rb.start, rb.end)));
            }
        }
        row.cells.sort_by_key(|c| c.rect.left);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paint(g: &mut BrightnessGrid, r: Rect, v: u8) {
        for y in r.top..r.bottom {
            for x in r.left..r.right {
                g.set(x, y, v);
            }
        }
    }

    /// `rows × cols` ruled grid of `cw × ch` cells with 2px rules, one text
    /// blob per cell, placed at (10, 10).
    fn ruled_table(rows: usize, cols: usize, cw: usize, ch: usize) -> BrightnessGrid {
        let (w, h) = (cols * cw + 2, rows * ch + 2);
        let mut g = BrightnessGrid::new(w + 20, h + 20);
        for i in 0..=rows {
            paint(&mut g, Rect::new(10, 10 + w, 10 + i * ch, 12 + i * ch), 0);
        }
        for j in 0..=cols {
            paint(&mut g, Rect::new(10 + j * cw, 12 + j * cw, 10, 10 + h), 0);
        }
        for i in 0..rows {
            for j in 0..cols {
                let (x, y) = (10 + j * cw + 12, 10 + i * ch + 14);
                paint(&mut g, Rect::new(x, x + 20, y, y + 8), 0);
            }
        }
        g
    }

    #[test]
    fn ruled_grid_yields_every_cell() {
        let g = ruled_table(4, 3, 60, 40);
        let rows = TableDetector::default()
            .detect(&RectView::whole(&g), 100.0, &BlockStructurer::default())
            .expect("table detected");
        assert_eq!(rows.len(), 4);
        for row in &rows {
            assert_eq!(row.cells.len(), 3);
            for cell in &row.cells {
                assert_eq!((cell.col_span, cell.row_span), (1, 1));
                assert_eq!(cell.lines.len(), 1, "{cell:?}");
                assert_eq!(cell.lines[0].words.len(), 1);
            }
        }
        let first = &rows[0].cells[0];
        assert_eq!(first.rect, Rect::new(12, 70, 12, 50));
        assert_eq!(first.lines[0].rect, Rect::new(22, 42, 24, 32));
    }

    #[test]
    fn missing_rule_segment_becomes_a_span() {
        let mut g = ruled_table(3, 3, 60, 40);
        // erase the rule between columns 0 and 1 inside the header row
        paint(&mut g, Rect::new(70, 72, 12, 50), WHITE);
        let rows = TableDetector::default()
            .detect(&RectView::whole(&g), 100.0, &BlockStructurer::default())
            .expect("table detected");
        assert_eq!(rows[0].cells.len(), 2);
        assert_eq!(rows[0].cells[0].col_span, 2);
        assert_eq!(rows[1].cells.len(), 3);
    }

    #[test]
    fn vertical_span_across_rows() {
        let mut g = ruled_table(3, 2, 60, 40);
        // erase the rule between rows 0 and 1 under the first column
        paint(&mut g, Rect::new(12, 68, 50, 52), WHITE);
        let rows = TableDetector::default()
            .detect(&RectView::whole(&g), 100.0, &BlockStructurer::default())
            .expect("table detected");
        assert_eq!(rows[0].cells[0].row_span, 2);
        assert_eq!(rows[1].cells.len(), 1, "the spanned position is not repeated");
    }

    #[test]
    fn plain_text_block_is_not_a_table() {
        let mut g = BrightnessGrid::new(200, 200);
        for l in 0..6 {
            paint(&mut g, Rect::new(10, 150, 10 + l * 30, 28 + l * 30), 0);
        }
        assert!(TableDetector::default()
            .detect(&RectView::whole(&g), 100.0, &BlockStructurer::default())
            .is_none());
    }

    #[test]
    fn small_blocks_are_skipped() {
        let g = ruled_table(2, 2, 10, 10);
        assert!(TableDetector::default()
            .detect(&RectView::whole(&g), 100.0, &BlockStructurer::default())
            .is_none());
    }

    #[test]
    fn completeness_compares_spacing() {
        let group = |c: usize| LineGroup {
            start: c,
            end: c + 1,
            centroid: c as f32,
            strength: 1.0,
        };
        let regular: Vec<_> = [0, 40, 80, 120].into_iter().map(group).collect();
        assert!(is_complete(&regular));
        let border_only: Vec<_> = [0, 120].into_iter().map(group).collect();
        assert!(!is_complete(&border_only));
        let skewed: Vec<_> = [0, 10, 200].into_iter().map(group).collect();
        assert!(!is_complete(&skewed));
    }
}
