//! Search for straight ink runs long enough to be grid lines.
use super::cluster::Obs;
use crate::geometry::RectView;
use crate::image::ImageView;

fn longest_run(values: impl Iterator<Item = u8>, ink: u8) -> usize {
    let (mut best, mut cur) = (0, 0);
    for v in values {
        if v < ink {
            cur += 1;
            best = best.max(cur);
        } else {
            cur = 0;
        }
    }
    best
}

/// Rows of `view` holding a horizontal run of at least `min_len` pixels
/// darker than `ink`.
pub(crate) fn matching_rows(view: &RectView<'_>, min_len: usize, ink: u8) -> Vec<Obs> {
    let g = view.grid();
    let r = view.rect;
    (r.top..r.bottom)
        .filter_map(|y| {
            let run = longest_run(g.row(y)[r.left..r.right].iter().copied(), ink);
            (run >= min_len).then_some(Obs {
                pos: y,
                strength: run as f32,
            })
        })
        .collect()
}

/// Columns of `view` holding a vertical run of at least `min_len` pixels.
pub(crate) fn matching_cols(view: &RectView<'_>, min_len: usize, ink: u8) -> Vec<Obs> {
    let g = view.grid();
    let r = view.rect;
    (r.left..r.right)
        .filter_map(|x| {
            let run = longest_run((r.top..r.bottom).map(|y| g.get(x, y)), ink);
            (run >= min_len).then_some(Obs {
                pos: x,
                strength: run as f32,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::image::BrightnessGrid;

    #[test]
    fn runs_are_measured_per_row_and_column() {
        let mut g = BrightnessGrid::new(20, 10);
        for x in 2..18 {
            g.set(x, 4, 0);
        }
        for y in 1..9 {
            g.set(6, y, 0);
        }
        let view = RectView::new(&g, Rect::of_grid(&g));
        let rows = matching_rows(&view, 10, 100);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].pos, 4);
        assert_eq!(rows[0].strength, 16.0);
        let cols = matching_cols(&view, 5, 100);
        assert_eq!(cols.iter().map(|o| o.pos).collect::<Vec<_>>(), vec![6]);
    }
}
