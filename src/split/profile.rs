//! Per-column / per-row ink counts along (optionally sheared) sampling paths.
use crate::geometry::Rect;
use crate::image::{BrightnessGrid, WHITE};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    /// Positions are columns; each path runs top to bottom.
    Columns,
    /// Positions are rows; each path runs left to right.
    Rows,
}

/// Offset applied at each step along a path for a shear of `degrees`,
/// measured from the path's midpoint so the centre row/column is unshifted.
pub(crate) fn shear_offsets(len: usize, degrees: f32) -> Vec<isize> {
    if degrees == 0.0 {
        return vec![0; len];
    }
    let slope = degrees.to_radians().tan();
    let mid = (len as f32 - 1.0) * 0.5;
    (0..len)
        .map(|i| ((i as f32 - mid) * slope).round() as isize)
        .collect()
}

/// Number of non-white pixels on the path through each position of `rect`.
/// Samples that the shear pushes outside `rect` count as white.
pub(crate) fn ink_profile(grid: &BrightnessGrid, rect: &Rect, axis: Axis, shear_degrees: f32) -> Vec<usize> {
    let (positions, along) = match axis {
        Axis::Columns => (rect.left..rect.right, rect.top..rect.bottom),
        Axis::Rows => (rect.top..rect.bottom, rect.left..rect.right),
    };
    let offsets = shear_offsets(along.len(), shear_degrees);
    let (lo, hi) = (positions.start as isize, positions.end as isize);
    positions
        .map(|p| {
            along
                .clone()
                .zip(&offsets)
                .filter(|&(a, &off)| {
                    let q = p as isize + off;
                    if q < lo || q >= hi {
                        return false;
                    }
                    let v = match axis {
                        Axis::Columns => grid.get(q as usize, a),
                        Axis::Rows => grid.get(a, q as usize),
                    };
                    v < WHITE
                })
                .count()
        })
        .collect()
}

/// Maximal runs `[start, end)` (indices into `is_gap`) of gap positions
/// that lie strictly between ink on both sides.
pub(crate) fn interior_runs(is_gap: &[bool]) -> Vec<(usize, usize)> {
    let Some(first_ink) = is_gap.iter().position(|&g| !g) else {
        return Vec::new();
    };
    let last_ink = is_gap.iter().rposition(|&g| !g).unwrap_or(first_ink);
    let mut runs = Vec::new();
    let mut start = None;
    for (i, &gap) in is_gap.iter().enumerate().take(last_ink + 1).skip(first_ink) {
        match (gap, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                runs.push((s, i));
                start = None;
            }
            _ => {}
        }
    }
    runs
}
