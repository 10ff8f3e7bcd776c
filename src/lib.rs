#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod cache;
pub mod config;
pub mod error;
pub mod geometry;
pub mod image;
pub mod layout;
pub mod pipeline;

// Stage modules: public for tools and experiments, tuned through the
// options structs aggregated in `LayoutParams`.
pub mod conditioner;
pub mod fft;
pub mod filters;
pub mod fonts;
pub mod regions;
pub mod split;
pub mod table;

// --- High-level re-exports -------------------------------------------------

// Main entry point and its results.
pub use crate::pipeline::{LayoutParams, PageAnalyzer, PageLayout, ProgressSink};

// Output model.
pub use crate::geometry::{BoundingBox, Rect};
pub use crate::layout::{Block, Line, Region, TableCell, TableRow, Word};

pub use crate::error::{LayoutError, LayoutResult};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use page_segmenter::prelude::*;
///
/// # fn main() {
/// let mut grid = BrightnessGrid::new(400, 300);
/// for y in 100..140 {
///     for x in 50..350 {
///         grid.set(x, y, 0);
///     }
/// }
/// let mut page = PageImage::from_brightness(grid, 150.0);
/// let layout = PageAnalyzer::new(LayoutParams::default()).analyze(&mut page, &NoProgress);
/// println!("regions={} lines={}", layout.leaves().len(), layout.lines().len());
/// # }
/// ```
pub mod prelude {
    pub use crate::image::{BrightnessGrid, PageImage};
    pub use crate::pipeline::NoProgress;
    pub use crate::{BoundingBox, LayoutParams, PageAnalyzer, PageLayout, Rect};
}

// --- Stage-level API (for tools & advanced users) --------------------------

pub mod stages {
    pub use crate::conditioner::{get_content_box, CorrectionReport, ImageConditioner};
    pub use crate::fft::{compute_fft, get_fft, SkewEstimator, Spectrum};
    pub use crate::fonts::FontMetricsAnalyzer;
    pub use crate::layout::{BlockStructurer, RegionTreeBuilder};
    pub use crate::regions::{color_regions, feather_dust, RegionMap};
    pub use crate::split::{split_columns, split_rows, SplitOptions};
    pub use crate::table::TableDetector;
}
