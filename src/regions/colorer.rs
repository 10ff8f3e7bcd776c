//! Connected-component labeling ("region coloring") over a brightness grid.
//!
//! Flood fill uses an explicit worklist so memory stays bounded on pages with
//! tens of millions of pixels. Per region it gathers pixel count, boundary
//! pixel count ("surface"), bounding rectangle and darkest brightness.
use crate::geometry::{Rect, RectView};
use crate::image::{BrightnessGrid, ImageView};
use serde::Serialize;

/// Label of pixels that belong to no region.
pub const BACKGROUND: u32 = 0;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RegionStats {
    pub label: u32,
    /// Pixel count.
    pub size: usize,
    /// Pixels with at least one 4-neighbour outside the region.
    pub surface: usize,
    pub bounds: Rect,
    pub min_brightness: u8,
}

impl RegionStats {
    /// `size / surface`; close to 1 for one-pixel strokes, larger for blobs.
    pub fn compactness(&self) -> f32 {
        self.size as f32 / self.surface.max(1) as f32
    }

    pub fn max_extent(&self) -> usize {
        self.bounds.width().max(self.bounds.height())
    }
}

/// Labels for every pixel of `rect` plus per-region statistics.
/// `regions[label - 1]` describes `label`.
#[derive(Clone, Debug)]
pub struct RegionMap {
    pub rect: Rect,
    pub labels: Vec<u32>,
    pub regions: Vec<RegionStats>,
}

impl RegionMap {
    /// Label at absolute pixel `(x, y)`; [`BACKGROUND`] outside the map.
    pub fn label_at(&self, x: usize, y: usize) -> u32 {
        let r = &self.rect;
        if x < r.left || x >= r.right || y < r.top || y >= r.bottom {
            return BACKGROUND;
        }
        self.labels[(y - r.top) * r.width() + (x - r.left)]
    }

    pub fn region(&self, label: u32) -> Option<&RegionStats> {
        label
            .checked_sub(1)
            .and_then(|i| self.regions.get(i as usize))
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Absolute coordinates of every pixel carrying `label`.
    pub fn pixels(&self, label: u32) -> impl Iterator<Item = (usize, usize)> + '_ {
        let bounds = self.region(label).map(|r| r.bounds).unwrap_or_default();
        (bounds.top..bounds.bottom).flat_map(move |y| {
            (bounds.left..bounds.right)
                .filter(move |&x| self.label_at(x, y) == label)
                .map(move |x| (x, y))
        })
    }
}

/// Running statistics of the region currently being flooded.
struct RegionAccumulator {
    indices: Vec<usize>,
    min_x: usize,
    max_x: usize,
    min_y: usize,
    max_y: usize,
    min_brightness: u8,
}

impl RegionAccumulator {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            indices: Vec::with_capacity(capacity),
            min_x: usize::MAX,
            max_x: 0,
            min_y: usize::MAX,
            max_y: 0,
            min_brightness: u8::MAX,
        }
    }

    fn reset(&mut self) {
        self.indices.clear();
        self.min_x = usize::MAX;
        self.max_x = 0;
        self.min_y = usize::MAX;
        self.max_y = 0;
        self.min_brightness = u8::MAX;
    }

    fn push(&mut self, idx: usize, x: usize, y: usize, brightness: u8) {
        self.indices.push(idx);
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
        self.min_brightness = self.min_brightness.min(brightness);
    }
}

#[inline]
fn belongs(v: u8, threshold: i32) -> bool {
    if threshold >= 0 {
        (v as i32) < threshold
    } else {
        v as i32 >= -threshold
    }
}

/// Label the whole grid. See [`color_regions_in`].
pub fn color_regions(grid: &BrightnessGrid, threshold: i32, include_diagonal: bool) -> RegionMap {
    color_regions_in(&RectView::whole(grid), threshold, include_diagonal)
}

/// Label connected pixels inside `view`.
///
/// A non-negative `threshold` selects pixels darker than it; a negative one
/// selects pixels at least as bright as its magnitude. `include_diagonal`
/// switches from 4- to 8-connectivity.
pub fn color_regions_in(view: &RectView<'_>, threshold: i32, include_diagonal: bool) -> RegionMap {
    let rect = view.rect;
    let grid = view.grid();
    let (w, h) = (rect.width(), rect.height());
    let mut labels = vec![BACKGROUND; w * h];
    let mut regions = Vec::new();
    let mut stack: Vec<usize> = Vec::new();
    let mut acc = RegionAccumulator::with_capacity(64);

    const ORTHOGONAL: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
    const DIAGONAL: [(isize, isize); 4] = [(-1, -1), (1, -1), (-1, 1), (1, 1)];

    let in_region = |lx: usize, ly: usize| belongs(grid.row(rect.top + ly)[rect.left + lx], threshold);

    for seed in 0..w * h {
        if labels[seed] != BACKGROUND || !in_region(seed % w, seed / w) {
            continue;
        }
        let label = regions.len() as u32 + 1;
        acc.reset();
        labels[seed] = label;
        stack.push(seed);
        while let Some(idx) = stack.pop() {
            let (lx, ly) = (idx % w, idx / w);
            acc.push(idx, lx, ly, grid.row(rect.top + ly)[rect.left + lx]);
            let neighbours = ORTHOGONAL
                .iter()
                .chain(if include_diagonal { &DIAGONAL[..] } else { &[] });
            for &(dx, dy) in neighbours {
                let nx = lx as isize + dx;
                let ny = ly as isize + dy;
                if nx < 0 || ny < 0 || nx >= w as isize || ny >= h as isize {
                    continue;
                }
                let (nx, ny) = (nx as usize, ny as usize);
                let nidx = ny * w + nx;
                if labels[nidx] == BACKGROUND && in_region(nx, ny) {
                    labels[nidx] = label;
                    stack.push(nidx);
                }
            }
        }

        let surface = acc
            .indices
            .iter()
            .filter(|&&idx| {
                let (lx, ly) = (idx % w, idx / w);
                ORTHOGONAL.iter().any(|&(dx, dy)| {
                    let nx = lx as isize + dx;
                    let ny = ly as isize + dy;
                    nx < 0
                        || ny < 0
                        || nx >= w as isize
                        || ny >= h as isize
                        || labels[ny as usize * w + nx as usize] != label
                })
            })
            .count();
        regions.push(RegionStats {
            label,
            size: acc.indices.len(),
            surface,
            bounds: Rect::new(
                rect.left + acc.min_x,
                rect.left + acc.max_x + 1,
                rect.top + acc.min_y,
                rect.top + acc.max_y + 1,
            ),
            min_brightness: acc.min_brightness,
        });
    }

    RegionMap {
        rect,
        labels,
        regions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::WHITE;

    fn paint(g: &mut BrightnessGrid, r: Rect) {
        for y in r.top..r.bottom {
            for x in r.left..r.right {
                g.set(x, y, 0);
            }
        }
    }

    #[test]
    fn white_grid_has_no_regions() {
        let map = color_regions(&BrightnessGrid::new(32, 32), WHITE as i32, false);
        assert!(map.is_empty());
    }

    #[test]
    fn separate_squares_get_separate_labels() {
        let mut g = BrightnessGrid::new(40, 40);
        paint(&mut g, Rect::new(2, 10, 2, 10));
        paint(&mut g, Rect::new(20, 25, 20, 25));
        let map = color_regions(&g, WHITE as i32, false);
        assert_eq!(map.len(), 2);
        let mut sizes: Vec<usize> = map.regions.iter().map(|r| r.size).collect();
        sizes.sort();
        assert_eq!(sizes, vec![25, 64]);
        assert_eq!(map.region(1).unwrap().bounds, Rect::new(2, 10, 2, 10));
        assert_eq!(map.region(1).unwrap().surface, 28);
    }

    #[test]
    fn diagonal_touch_depends_on_connectivity() {
        let mut g = BrightnessGrid::new(20, 20);
        paint(&mut g, Rect::new(2, 6, 2, 6));
        paint(&mut g, Rect::new(6, 10, 6, 10));
        assert_eq!(color_regions(&g, WHITE as i32, false).len(), 2);
        assert_eq!(color_regions(&g, WHITE as i32, true).len(), 1);
    }

    #[test]
    fn centred_square_is_one_region_of_its_area() {
        let mut g = BrightnessGrid::new(200, 200);
        paint(&mut g, Rect::new(90, 110, 90, 110));
        let map = color_regions(&g, WHITE as i32, true);
        assert_eq!(map.len(), 1);
        assert_eq!(map.regions[0].size, 400);
        assert_eq!(map.label_at(100, 100), 1);
        assert_eq!(map.pixels(1).count(), 400);
    }

    #[test]
    fn negative_threshold_labels_light_pixels() {
        let mut g = BrightnessGrid::new(10, 10);
        paint(&mut g, Rect::new(0, 10, 4, 5)); // splits the page in two
        let map = color_regions(&g, -(WHITE as i32), false);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn labeling_inside_a_view_reports_absolute_bounds() {
        let mut g = BrightnessGrid::new(30, 30);
        paint(&mut g, Rect::new(12, 14, 12, 15));
        let view = RectView::new(&g, Rect::new(10, 20, 10, 20));
        let map = color_regions_in(&view, WHITE as i32, false);
        assert_eq!(map.regions[0].bounds, Rect::new(12, 14, 12, 15));
        assert_eq!(map.label_at(13, 13), 1);
        assert_eq!(map.label_at(1, 1), BACKGROUND);
    }
}
