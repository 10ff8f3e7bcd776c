//! "Feather dusting": removal of stray specks that survive thresholding.
//!
//! Every connected region is judged on its own first (too small, too faint,
//! hairline-thin, or a page-spanning scanner artifact touching an edge).
//! Survivors that are big enough to stand alone become anchors; small
//! survivors (dots, commas, accents, specks) are kept only if, within a few
//! attachment rounds, they lie close to an anchor or to something already
//! attached. Everything else is painted white.
use super::colorer::{color_regions, RegionMap, RegionStats};
use crate::geometry::Rect;
use crate::image::{BrightnessGrid, WHITE};
use log::debug;
use serde::Serialize;

/// Darkest brightness a region must reach to be ink, for sharp scans.
pub const FAINT_LIMIT_SHARP: u8 = 64;
/// Same, for soft (blurry grayscale) scans.
pub const FAINT_LIMIT_SOFT: u8 = 96;
/// `size / surface` at or below which a region counts as a hairline.
pub const THIN_COMPACTNESS: f32 = 1.25;
/// Hairlines at least this many solo sizes long are kept (rules, borders).
pub const THIN_KEEP_FACTOR: usize = 4;
/// Fraction of the page a region must span to be an edge artifact.
pub const PAGE_SPAN_FRACTION: f32 = 0.7;
/// Rounds of proximity attachment for small regions.
pub const ATTACH_ROUNDS: usize = 3;

#[derive(Clone, Debug)]
pub struct DustParams {
    /// Regions whose larger extent is below this are always removed.
    pub min_size: usize,
    /// Regions reaching this extent survive without a neighbour.
    pub min_solo_size: usize,
    pub dpi: f32,
    pub is_binary: bool,
    pub is_sharp: bool,
}

impl DustParams {
    /// Defaults scaled to the page resolution: `dpi/100` and `dpi/25`.
    pub fn for_page(dpi: f32, is_binary: bool, is_sharp: bool) -> Self {
        Self {
            min_size: ((dpi / 100.0).round() as usize).max(1),
            min_solo_size: ((dpi / 25.0).round() as usize).max(2),
            dpi,
            is_binary,
            is_sharp,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DustReport {
    pub regions: usize,
    pub removed_small: usize,
    pub removed_faint: usize,
    pub removed_thin: usize,
    pub removed_edge: usize,
    pub removed_isolated: usize,
}

impl DustReport {
    pub fn removed(&self) -> usize {
        self.removed_small
            + self.removed_faint
            + self.removed_thin
            + self.removed_edge
            + self.removed_isolated
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Remove,
    Anchor,
    Pending,
}

/// Coarse occupancy of anchored regions used for proximity lookups.
struct AnchorGrid {
    cell: usize,
    cols: usize,
    rows: usize,
    marked: Vec<bool>,
}

impl AnchorGrid {
    fn new(w: usize, h: usize, cell: usize) -> Self {
        let cell = cell.max(1);
        let (cols, rows) = (w.div_ceil(cell).max(1), h.div_ceil(cell).max(1));
        Self {
            cell,
            cols,
            rows,
            marked: vec![false; cols * rows],
        }
    }

    fn cell_span(&self, r: &Rect) -> (usize, usize, usize, usize) {
        let c0 = (r.left / self.cell).min(self.cols - 1);
        let c1 = (r.right.saturating_sub(1) / self.cell).min(self.cols - 1);
        let r0 = (r.top / self.cell).min(self.rows - 1);
        let r1 = (r.bottom.saturating_sub(1) / self.cell).min(self.rows - 1);
        (c0, c1, r0, r1)
    }

    fn mark(&mut self, r: &Rect) {
        let (c0, c1, r0, r1) = self.cell_span(r);
        for row in r0..=r1 {
            for col in c0..=c1 {
                self.marked[row * self.cols + col] = true;
            }
        }
    }

    fn any(&self, r: &Rect) -> bool {
        let (c0, c1, r0, r1) = self.cell_span(r);
        (r0..=r1).any(|row| (c0..=c1).any(|col| self.marked[row * self.cols + col]))
    }
}

fn expand(r: &Rect, by: usize, w: usize, h: usize) -> Rect {
    Rect::new(
        r.left.saturating_sub(by),
        (r.right + by).min(w),
        r.top.saturating_sub(by),
        (r.bottom + by).min(h),
    )
}

/// Region touching a page edge that spans most of the page, measured on a
/// grid of squares so that sparse diagonal streaks do not count.
fn is_edge_artifact(map: &RegionMap, region: &RegionStats, w: usize, h: usize, square: usize) -> bool {
    let b = &region.bounds;
    let touches = b.left == 0 || b.top == 0 || b.right == w || b.bottom == h;
    let wide = b.width() as f32 >= PAGE_SPAN_FRACTION * w as f32;
    let tall = b.height() as f32 >= PAGE_SPAN_FRACTION * h as f32;
    if !touches || !(wide || tall) {
        return false;
    }
    let square = square.max(1);
    let (cols, rows) = (w.div_ceil(square), h.div_ceil(square));
    let mut col_hit = vec![false; cols];
    let mut row_hit = vec![false; rows];
    for (x, y) in map.pixels(region.label) {
        col_hit[x / square] = true;
        row_hit[y / square] = true;
    }
    let col_span = col_hit.iter().filter(|&&c| c).count() as f32 / cols as f32;
    let row_span = row_hit.iter().filter(|&&c| c).count() as f32 / rows as f32;
    col_span >= PAGE_SPAN_FRACTION || row_span >= PAGE_SPAN_FRACTION
}

/// Remove specks from `grid` in place.
pub fn feather_dust(grid: &mut BrightnessGrid, params: &DustParams) -> DustReport {
    let (w, h) = (grid.width(), grid.height());
    let map = color_regions(grid, WHITE as i32, params.is_binary);
    let mut report = DustReport {
        regions: map.len(),
        ..Default::default()
    };
    if map.is_empty() {
        return report;
    }

    let faint_limit = if params.is_sharp || params.is_binary {
        FAINT_LIMIT_SHARP
    } else {
        FAINT_LIMIT_SOFT
    };
    let square = ((params.dpi / 8.0) as usize).max(1);

    let mut verdicts = Vec::with_capacity(map.len());
    for region in &map.regions {
        let extent = region.max_extent();
        let verdict = if extent < params.min_size {
            report.removed_small += 1;
            Verdict::Remove
        } else if region.min_brightness > faint_limit {
            report.removed_faint += 1;
            Verdict::Remove
        } else if region.compactness() <= THIN_COMPACTNESS
            && extent < params.min_solo_size * THIN_KEEP_FACTOR
        {
            report.removed_thin += 1;
            Verdict::Remove
        } else if is_edge_artifact(&map, region, w, h, square) {
            report.removed_edge += 1;
            Verdict::Remove
        } else if extent >= params.min_solo_size
            || region.size * 4 >= params.min_solo_size * params.min_solo_size
        {
            Verdict::Anchor
        } else {
            Verdict::Pending
        };
        verdicts.push(verdict);
    }

    let mut anchors = AnchorGrid::new(w, h, params.min_size);
    for (region, v) in map.regions.iter().zip(&verdicts) {
        if *v == Verdict::Anchor {
            anchors.mark(&region.bounds);
        }
    }
    for _ in 0..ATTACH_ROUNDS {
        let mut attached = Vec::new();
        for (i, region) in map.regions.iter().enumerate() {
            if verdicts[i] != Verdict::Pending {
                continue;
            }
            let reach = (region.max_extent() * 2).max(params.min_size * 2);
            if anchors.any(&expand(&region.bounds, reach, w, h)) {
                attached.push(i);
            }
        }
        if attached.is_empty() {
            break;
        }
        for i in attached {
            verdicts[i] = Verdict::Anchor;
            anchors.mark(&map.regions[i].bounds);
        }
    }

    for (region, v) in map.regions.iter().zip(verdicts.iter_mut()) {
        if *v == Verdict::Pending {
            report.removed_isolated += 1;
            *v = Verdict::Remove;
        }
        if *v == Verdict::Remove {
            let b = region.bounds;
            for y in b.top..b.bottom {
                for x in b.left..b.right {
                    if map.label_at(x, y) == region.label {
                        grid.set(x, y, WHITE);
                    }
                }
            }
        }
    }

    debug!(
        "feather_dust regions={} removed={} (small={} faint={} thin={} edge={} isolated={})",
        report.regions,
        report.removed(),
        report.removed_small,
        report.removed_faint,
        report.removed_thin,
        report.removed_edge,
        report.removed_isolated
    );
    report
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

    fn params() -> DustParams {
        DustParams::for_page(300.0, true, true)
    }

    #[test]
    fn isolated_speck_is_removed_but_glyph_and_its_dot_survive() {
        let mut g = BrightnessGrid::new(300, 300);
        // an "i": stem plus a dot just above it
        paint(&mut g, Rect::new(100, 104, 110, 140), 0);
        paint(&mut g, Rect::new(100, 104, 102, 106), 0);
        // a lone speck far from any ink
        paint(&mut g, Rect::new(250, 253, 250, 253), 0);
        let report = feather_dust(&mut g, &params());
        assert_eq!(report.removed_isolated, 1);
        assert_eq!(g.get(101, 103), 0, "dot of the i must survive");
        assert_eq!(g.get(101, 120), 0);
        assert_eq!(g.get(251, 251), WHITE);
    }

    #[test]
    fn single_pixels_and_faint_smudges_are_removed() {
        let mut g = BrightnessGrid::new(200, 200);
        paint(&mut g, Rect::new(50, 80, 50, 80), 0);
        g.set(82, 82, 0);
        paint(&mut g, Rect::new(120, 160, 120, 160), 110);
        let report = feather_dust(&mut g, &params());
        assert_eq!(report.removed_small, 1);
        assert_eq!(report.removed_faint, 1);
        assert_eq!(g.get(82, 82), WHITE);
        assert_eq!(g.get(130, 130), WHITE);
        assert_eq!(g.get(60, 60), 0);
    }

    #[test]
    fn edge_stripe_from_scanner_is_removed() {
        let mut g = BrightnessGrid::new(400, 400);
        paint(&mut g, Rect::new(0, 12, 0, 400), 0);
        paint(&mut g, Rect::new(100, 140, 100, 140), 0);
        let report = feather_dust(&mut g, &params());
        assert_eq!(report.removed_edge, 1);
        assert_eq!(g.get(5, 200), WHITE);
        assert_eq!(g.get(120, 120), 0);
    }

    #[test]
    fn short_hairline_is_removed_long_rule_is_kept() {
        let mut g = BrightnessGrid::new(400, 400);
        paint(&mut g, Rect::new(50, 70, 50, 51), 0);
        paint(&mut g, Rect::new(50, 350, 200, 201), 0);
        let report = feather_dust(&mut g, &params());
        assert_eq!(report.removed_thin, 1);
        assert_eq!(g.get(60, 50), WHITE);
        assert_eq!(g.get(200, 200), 0);
    }
}
