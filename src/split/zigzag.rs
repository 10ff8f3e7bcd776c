//! Threading a cut between touching lines.
//!
//! When no straight white row separates two lines (a descender touching the
//! ascender below), a left-to-right path of white pixels may still exist if
//! it is allowed to step up or down between columns.
use crate::geometry::Rect;
use crate::image::BrightnessGrid;

const UNREACHED: u32 = u32::MAX;

/// Row of a white path through every column of `rect`, restricted to rows
/// `band.0..band.1` and moving at most `max_step` rows between columns.
/// Returns one absolute row per column, or `None` when no path exists.
pub(crate) fn find_path(
    grid: &BrightnessGrid,
    rect: &Rect,
    band: (usize, usize),
    max_step: usize,
) -> Option<Vec<usize>> {
    let (b0, b1) = band;
    if b0 >= b1 || rect.is_empty() {
        return None;
    }
    let rows = b1 - b0;
    let cols = rect.width();
    // parent[c * rows + r]: band row in column c-1 that reaches (c, r)
    let mut parent = vec![UNREACHED; cols * rows];
    let mut reach = vec![false; rows];
    for r in 0..rows {
        reach[r] = grid.is_white(rect.left, b0 + r);
        if reach[r] {
            parent[r] = r as u32;
        }
    }
    let mut next = vec![false; rows];
    for c in 1..cols {
        let x = rect.left + c;
        let mut any = false;
        for r in 0..rows {
            next[r] = false;
            if !grid.is_white(x, b0 + r) {
                continue;
            }
            let lo = r.saturating_sub(max_step);
            let hi = (r + max_step + 1).min(rows);
            // nearest reachable predecessor, preferring a level step
            let best = (lo..hi)
                .filter(|&p| reach[p])
                .min_by_key(|&p| p.abs_diff(r));
            if let Some(p) = best {
                parent[c * rows + r] = p as u32;
                next[r] = true;
                any = true;
            }
        }
        if !any {
            return None;
        }
        std::mem::swap(&mut reach, &mut next);
    }

    let mid = rows / 2;
    let mut r = (0..rows)
        .filter(|&r| reach[r])
        .min_by_key(|&r| r.abs_diff(mid))?;
    let mut path = vec![0; cols];
    for c in (0..cols).rev() {
        path[c] = b0 + r;
        r = parent[c * rows + r] as usize;
    }
    Some(path)
}
