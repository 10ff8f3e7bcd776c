//! Page rotation estimate from spectral peaks.
//!
//! Text lines, table rules and column edges produce periodic structure whose
//! spectral peaks line up along the page's dominant directions. The
//! estimator picks the strongest local maxima of the (half-plane) spectrum,
//! refines each to sub-bin precision, and votes the angle of every peak and
//! every peak pair into an angle histogram restricted to `±max_angle_deg`.
//! Votes are weighted by `distance × magnitude₁ × magnitude₂`. This is a
//! majority vote over genuine and spurious peaks alike; the heaviest bucket
//! is a best guess, not a guarantee.
use super::Spectrum;
use serde::Deserialize;

/// Reshaping applied to peak magnitudes before voting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MagnitudeAdjust {
    None,
    #[default]
    Sqrt,
    Log,
}

impl MagnitudeAdjust {
    fn apply(self, m: f64) -> f64 {
        match self {
            MagnitudeAdjust::None => m,
            MagnitudeAdjust::Sqrt => m.sqrt(),
            MagnitudeAdjust::Log => (1.0 + m).ln(),
        }
    }
}

/// Histogram over `[-max_deg, max_deg]` of weighted angle votes.
pub(crate) struct AngleHistogram {
    bins: Vec<f64>,
    max_deg: f64,
    bin_width: f64,
}

impl AngleHistogram {
    pub(crate) fn new(num_bins: usize, max_deg: f64) -> Self {
        assert!(num_bins > 0, "angle histogram requires at least one bin");
        AngleHistogram {
            bins: vec![0.0; num_bins],
            max_deg,
            bin_width: 2.0 * max_deg / num_bins as f64,
        }
    }

    pub(crate) fn accumulate(&mut self, angle_deg: f64, weight: f64) {
        if !angle_deg.is_finite() || angle_deg.abs() > self.max_deg {
            return;
        }
        let idx = ((angle_deg + self.max_deg) / self.bin_width) as usize;
        let idx = idx.min(self.bins.len() - 1);
        self.bins[idx] += weight.max(0.0);
    }

    /// `[1, 2, 1]/4` smoothing with replicated ends.
    pub(crate) fn smooth_121(&mut self) {
        let n = self.bins.len();
        if n <= 1 {
            return;
        }
        let smoothed: Vec<f64> = (0..n)
            .map(|i| {
                let prev = self.bins[i.saturating_sub(1)];
                let next = self.bins[(i + 1).min(n - 1)];
                (prev + 2.0 * self.bins[i] + next) * 0.25
            })
            .collect();
        self.bins = smoothed;
    }

    pub(crate) fn peak(&self) -> Option<f64> {
        let (idx, &best) = self
            .bins
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))?;
        (best > 0.0).then(|| -self.max_deg + (idx as f64 + 0.5) * self.bin_width)
    }
}

#[derive(Clone, Copy, Debug)]
struct Peak {
    fx: f64,
    fy: f64,
    weight: f64,
}

/// Fold a direction angle onto `[-45°, 45°)`, treating directions 90° apart
/// as the same page orientation.
fn fold_quarter(angle_deg: f64) -> f64 {
    (angle_deg + 45.0).rem_euclid(90.0) - 45.0
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SkewEstimator {
    /// Number of spectral peaks entering the vote.
    pub peaks: usize,
    /// Histogram resolution over `[-max_angle_deg, max_angle_deg]`.
    pub buckets: usize,
    pub max_angle_deg: f32,
    pub adjust: MagnitudeAdjust,
}

impl Default for SkewEstimator {
    fn default() -> Self {
        Self {
            peaks: 24,
            buckets: 600,
            max_angle_deg: 30.0,
            adjust: MagnitudeAdjust::Sqrt,
        }
    }
}

impl SkewEstimator {
    /// Estimated rotation of the page content in degrees (y-down image
    /// coordinates), or `None` if the spectrum carries no structure.
    pub fn estimate(&self, spectrum: &Spectrum) -> Option<f32> {
        let peaks = self.find_peaks(spectrum);
        if peaks.is_empty() {
            return None;
        }
        let mut hist = AngleHistogram::new(self.buckets.max(1), self.max_angle_deg as f64);
        for (i, p) in peaks.iter().enumerate() {
            let len = p.fx.hypot(p.fy);
            hist.accumulate(
                fold_quarter(p.fy.atan2(p.fx).to_degrees()),
                len * p.weight * p.weight,
            );
            for q in &peaks[i + 1..] {
                let (dx, dy) = (q.fx - p.fx, q.fy - p.fy);
                let dist = dx.hypot(dy);
                if dist <= f64::EPSILON {
                    continue;
                }
                hist.accumulate(
                    fold_quarter(dy.atan2(dx).to_degrees()),
                    dist * p.weight * q.weight,
                );
            }
        }
        hist.smooth_121();
        hist.smooth_121();
        hist.peak().map(|a| a as f32)
    }

    /// Strongest local maxima in the upper half-plane (the other half mirrors
    /// it for real input), refined by parabolic interpolation.
    fn find_peaks(&self, s: &Spectrum) -> Vec<Peak> {
        let (nx, ny) = (s.dim_x, s.dim_y);
        if nx < 3 || ny < 3 {
            return Vec::new();
        }
        let mag = |i: isize, j: isize| {
            s.magnitude(
                i.rem_euclid(nx as isize) as usize,
                j.rem_euclid(ny as isize) as usize,
            )
        };
        let mut candidates: Vec<(usize, usize, f64)> = Vec::new();
        for j in 0..ny {
            for i in 0..nx {
                let (fx, fy) = s.frequency(i, j);
                if fy < 0.0 || (fy == 0.0 && fx <= 0.0) {
                    continue;
                }
                let m = s.magnitude(i, j);
                if m <= 1e-9 {
                    continue;
                }
                let (ii, jj) = (i as isize, j as isize);
                let is_max = (-1..=1).all(|dj| {
                    (-1..=1).all(|di| (di == 0 && dj == 0) || mag(ii + di, jj + dj) <= m)
                });
                if is_max {
                    candidates.push((i, j, m));
                }
            }
        }
        candidates.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));
        candidates.truncate(self.peaks);

        candidates
            .into_iter()
            .map(|(i, j, m)| {
                let (ii, jj) = (i as isize, j as isize);
                let offset = |lo: f64, hi: f64| {
                    let denom = lo - 2.0 * m + hi;
                    if denom.abs() < 1e-12 {
                        0.0
                    } else {
                        (0.5 * (lo - hi) / denom).clamp(-0.5, 0.5)
                    }
                };
                let ox = offset(mag(ii - 1, jj), mag(ii + 1, jj));
                let oy = offset(mag(ii, jj - 1), mag(ii, jj + 1));
                let (fx, fy) = s.frequency(i, j);
                Peak {
                    fx: fx + ox / nx as f64,
                    fy: fy + oy / ny as f64,
                    weight: self.adjust.apply(m),
                }
            })
            .collect()
    }
}
