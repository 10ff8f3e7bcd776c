//! Whitespace-gap splitting of page rectangles.
//!
//! A split looks for runs of white columns (or rows) at least `min_margin`
//! wide between pieces of ink and cuts the rectangle there. Sampling paths
//! may be sheared to tolerate slightly rotated text, and row splitting can
//! fall back to a zigzag path that threads between touching lines.
mod profile;
mod zigzag;

pub use profile::Axis;
pub(crate) use profile::shear_offsets;

use crate::geometry::{Rect, RectView};
use profile::{ink_profile, interior_runs};
use serde::Deserialize;

/// Parameters of a single split.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SplitOptions {
    /// Minimum gap width in pixels.
    pub min_margin: usize,
    /// Shear of the sampling path; positive leans the path to the right
    /// going down (columns) or downward going right (rows).
    pub shear_degrees: f32,
    /// Non-white pixels tolerated on a gap path.
    pub max_noise: usize,
    /// With a non-zero shear, also demand that the unsheared path is white.
    pub require_vertical_split: bool,
    /// Row splitting only: fall back to a zigzag cut.
    pub zigzag: bool,
    /// Rows a zigzag path may move between neighbouring columns.
    pub zigzag_step: usize,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            min_margin: 1,
            shear_degrees: 0.0,
            max_noise: 0,
            require_vertical_split: false,
            zigzag: false,
            zigzag_step: 1,
        }
    }
}

impl SplitOptions {
    pub fn with_margin(min_margin: usize) -> Self {
        Self {
            min_margin: min_margin.max(1),
            ..Self::default()
        }
    }

    pub fn with_shear(mut self, degrees: f32) -> Self {
        self.shear_degrees = degrees;
        self
    }

    pub fn with_zigzag(mut self, step: usize) -> Self {
        self.zigzag = true;
        self.zigzag_step = step.max(1);
        self
    }
}

/// Cut `view` at vertical white gaps. Parts are ordered left to right and
/// trimmed to their ink. Returns `[view]` unchanged when nothing splits.
pub fn split_columns<'g>(view: &RectView<'g>, opts: &SplitOptions) -> Vec<RectView<'g>> {
    split_straight(view, Axis::Columns, opts)
}

/// Cut `view` at horizontal white gaps, top to bottom. With
/// [`SplitOptions::zigzag`], a view that has no straight gap is cut at the
/// midline of a threadable white path and both halves are split again.
pub fn split_rows<'g>(view: &RectView<'g>, opts: &SplitOptions) -> Vec<RectView<'g>> {
    let parts = split_straight(view, Axis::Rows, opts);
    if parts.len() > 1 || !opts.zigzag {
        return parts;
    }
    split_zigzag(view, opts).unwrap_or(parts)
}

/// Dispatch on axis.
pub fn split<'g>(view: &RectView<'g>, axis: Axis, opts: &SplitOptions) -> Vec<RectView<'g>> {
    match axis {
        Axis::Columns => split_columns(view, opts),
        Axis::Rows => split_rows(view, opts),
    }
}

fn split_straight<'g>(view: &RectView<'g>, axis: Axis, opts: &SplitOptions) -> Vec<RectView<'g>> {
    if view.is_empty() {
        return vec![*view];
    }
    let Some(content) = view.content_rect() else {
        return vec![*view];
    };
    let grid = view.grid();
    let ink = ink_profile(grid, &content, axis, opts.shear_degrees);
    let upright = (opts.require_vertical_split && opts.shear_degrees != 0.0)
        .then(|| ink_profile(grid, &content, axis, 0.0));
    let is_gap: Vec<bool> = ink
        .iter()
        .enumerate()
        .map(|(i, &c)| c <= opts.max_noise && upright.as_ref().map_or(true, |u| u[i] <= opts.max_noise))
        .collect();
    let runs: Vec<(usize, usize)> = interior_runs(&is_gap)
        .into_iter()
        .filter(|(s, e)| e - s >= opts.min_margin.max(1))
        .collect();
    if runs.is_empty() {
        return vec![*view];
    }

    let clean: Vec<bool> = runs
        .iter()
        .map(|&(s, e)| ink[s..e].iter().all(|&c| c == 0))
        .collect();
    let sides = |k: usize| (k == 0 || clean[k - 1]) && (k == runs.len() || clean[k]);
    let mut parts = Vec::with_capacity(runs.len() + 1);
    if opts.shear_degrees == 0.0 {
        let (base, len) = match axis {
            Axis::Columns => (content.left, content.width()),
            Axis::Rows => (content.top, content.height()),
        };
        let mut start = 0;
        for k in 0..=runs.len() {
            let end = runs.get(k).map_or(len, |r| r.0);
            let rect = match axis {
                Axis::Columns => Rect::new(base + start, base + end, content.top, content.bottom),
                Axis::Rows => Rect::new(content.left, content.right, base + start, base + end),
            };
            if let Some(mut part) = view.with_rect(rect).trimmed() {
                part.split_clean = sides(k);
                parts.push(part);
            }
            if let Some(r) = runs.get(k) {
                start = r.1;
            }
        }
    } else {
        let cuts: Vec<usize> = runs.iter().map(|&(s, e)| (s + e) / 2).collect();
        for (k, hull) in sheared_hulls(view, &content, axis, opts.shear_degrees, &cuts)
            .into_iter()
            .enumerate()
        {
            if let Some(rect) = hull {
                let mut part = view.with_rect(rect);
                part.split_clean = sides(k);
                parts.push(part);
            }
        }
    }
    if parts.len() < 2 {
        return vec![*view];
    }
    parts
}

/// Bounding box of the ink on each side of slanted cuts. A pixel belongs
/// to the part whose range of sheared positions holds the path through it,
/// so each part keeps all of its own slanted strokes. `cuts` are ascending
/// positions relative to the start of `content` along `axis`.
fn sheared_hulls(
    view: &RectView<'_>,
    content: &Rect,
    axis: Axis,
    shear_degrees: f32,
    cuts: &[usize],
) -> Vec<Option<Rect>> {
    let grid = view.grid();
    let mut hulls: Vec<Option<Rect>> = vec![None; cuts.len() + 1];
    let offsets = match axis {
        Axis::Columns => shear_offsets(content.height(), shear_degrees),
        Axis::Rows => shear_offsets(content.width(), shear_degrees),
    };
    for y in content.top..content.bottom {
        for x in content.left..content.right {
            if grid.is_white(x, y) {
                continue;
            }
            let position = match axis {
                Axis::Columns => (x - content.left) as isize - offsets[y - content.top],
                Axis::Rows => (y - content.top) as isize - offsets[x - content.left],
            };
            let k = cuts.partition_point(|&c| c as isize <= position);
            let pixel = Rect::new(x, x + 1, y, y + 1);
            hulls[k] = Some(hulls[k].map_or(pixel, |h| h.hull(&pixel)));
        }
    }
    hulls
}

fn split_zigzag<'g>(view: &RectView<'g>, opts: &SplitOptions) -> Option<Vec<RectView<'g>>> {
    let content = view.content_rect()?;
    let h = content.height();
    if h < 3 || content.width() < 2 {
        return None;
    }
    let guard = (h / 5).max(1);
    let band = (content.top + guard, content.bottom - guard);
    let path = zigzag::find_path(view.grid(), &content, band, opts.zigzag_step)?;
    let lo = *path.iter().min()?;
    let hi = *path.iter().max()?;
    let cut = (lo + hi + 1) / 2;
    if cut <= content.top || cut >= content.bottom {
        return None;
    }
    let upper = view
        .with_rect(Rect::new(content.left, content.right, content.top, cut))
        .trimmed()?;
    let lower = view
        .with_rect(Rect::new(content.left, content.right, cut, content.bottom))
        .trimmed()?;
    let mut parts = Vec::new();
    for mut half in [upper, lower] {
        half.split_clean = false;
        for mut p in split_rows(&half, opts) {
            p.split_clean = false;
            parts.push(p);
        }
    }
    Some(parts)
}
