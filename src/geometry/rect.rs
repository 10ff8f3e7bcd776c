//! Half-open pixel rectangles and views of them over a shared brightness grid.
use super::bbox::BoundingBox;
use crate::image::{BrightnessGrid, ImageView, WHITE};
use serde::Serialize;

/// Column range `[left, right)` × row range `[top, bottom)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Rect {
    pub left: usize,
    pub right: usize,
    pub top: usize,
    pub bottom: usize,
}

impl Rect {
    pub fn new(left: usize, right: usize, top: usize, bottom: usize) -> Self {
        assert!(
            left <= right && top <= bottom,
            "inverted rectangle [{left},{right})x[{top},{bottom})"
        );
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    pub fn of_grid(grid: &BrightnessGrid) -> Self {
        Self::new(0, grid.width(), 0, grid.height())
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.right - self.left
    }
    #[inline]
    pub fn height(&self) -> usize {
        self.bottom - self.top
    }
    #[inline]
    pub fn area(&self) -> usize {
        self.width() * self.height()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }

    /// Smallest rectangle covering both; empty operands are ignored.
    pub fn hull(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Rect {
            left: self.left.min(other.left),
            right: self.right.max(other.right),
            top: self.top.min(other.top),
            bottom: self.bottom.max(other.bottom),
        }
    }

    pub fn hull_all<'a, I: IntoIterator<Item = &'a Rect>>(rects: I) -> Option<Rect> {
        rects
            .into_iter()
            .filter(|r| !r.is_empty())
            .fold(None, |acc: Option<Rect>, r| Some(acc.map_or(*r, |a| a.hull(r))))
    }

    pub fn contains(&self, other: &Rect) -> bool {
        self.left <= other.left
            && self.right >= other.right
            && self.top <= other.top
            && self.bottom >= other.bottom
    }

    pub fn horizontal_overlap(&self, other: &Rect) -> usize {
        self.right
            .min(other.right)
            .saturating_sub(self.left.max(other.left))
    }

    pub fn vertical_overlap(&self, other: &Rect) -> usize {
        self.bottom
            .min(other.bottom)
            .saturating_sub(self.top.max(other.top))
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.horizontal_overlap(other) > 0 && self.vertical_overlap(other) > 0
    }

    pub fn translate(&self, dx: usize, dy: usize) -> Rect {
        Rect {
            left: self.left + dx,
            right: self.right + dx,
            top: self.top + dy,
            bottom: self.bottom + dy,
        }
    }

    /// Inclusive absolute box; `None` for empty rectangles.
    pub fn to_bbox(&self) -> Option<BoundingBox> {
        if self.is_empty() {
            return None;
        }
        Some(BoundingBox::new(
            self.left as i32,
            self.right as i32 - 1,
            self.top as i32,
            self.bottom as i32 - 1,
        ))
    }
}

/// A rectangle over a shared grid. Copies are independent: narrowing one
/// view never affects a sibling.
#[derive(Clone, Copy, Debug)]
pub struct RectView<'g> {
    grid: &'g BrightnessGrid,
    pub rect: Rect,
    /// Whether the cut that produced this view ran through pure white.
    pub split_clean: bool,
}

impl<'g> RectView<'g> {
    pub fn new(grid: &'g BrightnessGrid, rect: Rect) -> Self {
        assert!(
            rect.left <= rect.right
                && rect.top <= rect.bottom
                && rect.right <= grid.width()
                && rect.bottom <= grid.height(),
            "rectangle {rect:?} outside {}x{} grid",
            grid.width(),
            grid.height()
        );
        Self {
            grid,
            rect,
            split_clean: true,
        }
    }

    pub fn whole(grid: &'g BrightnessGrid) -> Self {
        Self::new(grid, Rect::of_grid(grid))
    }

    /// Sibling view over the same grid.
    pub fn with_rect(&self, rect: Rect) -> Self {
        let mut v = RectView::new(self.grid, rect);
        v.split_clean = self.split_clean;
        v
    }

    #[inline]
    pub fn grid(&self) -> &'g BrightnessGrid {
        self.grid
    }
    #[inline]
    pub fn width(&self) -> usize {
        self.rect.width()
    }
    #[inline]
    pub fn height(&self) -> usize {
        self.rect.height()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rect.is_empty()
    }

    /// Sum of darkness along column `x` within the view's rows.
    pub fn column_darkness(&self, x: usize) -> u32 {
        (self.rect.top..self.rect.bottom)
            .map(|y| self.grid.darkness(x, y))
            .sum()
    }

    /// Sum of darkness along row `y` within the view's columns.
    pub fn row_darkness(&self, y: usize) -> u32 {
        self.grid.row(y)[self.rect.left..self.rect.right]
            .iter()
            .map(|&v| (WHITE - v) as u32)
            .sum()
    }

    pub fn is_all_white(&self) -> bool {
        (self.rect.top..self.rect.bottom).all(|y| {
            self.grid.row(y)[self.rect.left..self.rect.right]
                .iter()
                .all(|&v| v >= WHITE)
        })
    }

    /// Pixels strictly darker than `threshold`.
    pub fn dark_count(&self, threshold: u8) -> usize {
        (self.rect.top..self.rect.bottom)
            .map(|y| {
                self.grid.row(y)[self.rect.left..self.rect.right]
                    .iter()
                    .filter(|&&v| v < threshold)
                    .count()
            })
            .sum()
    }

    pub fn mean_brightness(&self) -> f32 {
        if self.is_empty() {
            return WHITE as f32;
        }
        let total: u64 = (self.rect.top..self.rect.bottom)
            .map(|y| {
                self.grid.row(y)[self.rect.left..self.rect.right]
                    .iter()
                    .map(|&v| v as u64)
                    .sum::<u64>()
            })
            .sum();
        total as f32 / self.rect.area() as f32
    }

    pub fn min_brightness(&self) -> u8 {
        (self.rect.top..self.rect.bottom)
            .filter_map(|y| {
                self.grid.row(y)[self.rect.left..self.rect.right]
                    .iter()
                    .copied()
                    .min()
            })
            .min()
            .unwrap_or(WHITE)
    }

    /// Tightest rectangle holding every non-white pixel of the view.
    ///
    /// Narrows columns, then rows, and repeats until neither moves.
    pub fn content_rect(&self) -> Option<Rect> {
        let g = self.grid;
        let col_dark = |x: usize, r: &Rect| (r.top..r.bottom).any(|y| !g.is_white(x, y));
        let row_dark = |y: usize, r: &Rect| g.row(y)[r.left..r.right].iter().any(|&v| v < WHITE);
        let mut r = self.rect;
        loop {
            let before = r;
            while r.left < r.right && !col_dark(r.left, &r) {
                r.left += 1;
            }
            while r.right > r.left && !col_dark(r.right - 1, &r) {
                r.right -= 1;
            }
            if r.is_empty() {
                return None;
            }
            while r.top < r.bottom && !row_dark(r.top, &r) {
                r.top += 1;
            }
            while r.bottom > r.top && !row_dark(r.bottom - 1, &r) {
                r.bottom -= 1;
            }
            if r.is_empty() {
                return None;
            }
            if r == before {
                return Some(r);
            }
        }
    }

    /// This view narrowed to its content; `None` if entirely white.
    pub fn trimmed(&self) -> Option<RectView<'g>> {
        self.content_rect().map(|r| self.with_rect(r))
    }
}
