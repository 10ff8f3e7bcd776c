/// Consecutive matching rows (or columns) that form one grid line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineGroup {
    /// First member position.
    pub start: usize,
    /// One past the last member position.
    pub end: usize,
    /// Strength-weighted mean position.
    pub centroid: f32,
    pub strength: f32,
}

impl LineGroup {
    pub fn thickness(&self) -> usize {
        self.end - self.start
    }
}

/// A matching position and the length of its ink run.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Obs {
    pub pos: usize,
    pub strength: f32,
}

fn close(cur: &[Obs]) -> LineGroup {
    let strength: f32 = cur.iter().map(|o| o.strength).sum();
    let weighted: f32 = cur.iter().map(|o| o.pos as f32 * o.strength).sum();
    let (first, last) = (cur[0].pos, cur[cur.len() - 1].pos);
    LineGroup {
        start: first,
        end: last + 1,
        centroid: if strength > 0.0 {
            weighted / strength
        } else {
            (first + last) as f32 * 0.5
        },
        strength,
    }
}

/// Group observations whose positions are at most `eps` apart; groups whose
/// total strength stays below `min_strength` are dropped.
pub(crate) fn cluster_1d(mut obs: Vec<Obs>, eps: usize, min_strength: f32) -> Vec<LineGroup> {
    if obs.is_empty() {
        return Vec::new();
    }
    obs.sort_by_key(|o| o.pos);
    let mut groups = Vec::new();
    let mut cur: Vec<Obs> = Vec::new();
    for o in obs {
        match cur.last() {
            Some(last) if o.pos - last.pos > eps => {
                let g = close(&cur);
                if g.strength >= min_strength {
                    groups.push(g);
                }
                cur = vec![o];
            }
            _ => cur.push(o),
        }
    }
    if !cur.is_empty() {
        let g = close(&cur);
        if g.strength >= min_strength {
            groups.push(g);
        }
    }
    groups
}

/// Smallest and largest distance between consecutive group centroids.
pub(crate) fn spacing_range(groups: &[LineGroup]) -> Option<(f32, f32)> {
    groups
        .windows(2)
        .map(|w| w[1].centroid - w[0].centroid)
        .fold(None, |acc, d| match acc {
            None => Some((d, d)),
            Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
        })
}
