//! Page analyzer driving conditioning, segmentation and measurement.
//!
//! ```no_run
//! use page_segmenter::image::PageImage;
//! use page_segmenter::pipeline::{LayoutParams, LogProgress, PageAnalyzer};
//!
//! # fn example(raster: image::GrayImage) {
//! let analyzer = PageAnalyzer::new(LayoutParams::default());
//! let mut page = PageImage::new(raster, 300.0);
//! let layout = analyzer.analyze(&mut page, &LogProgress);
//! println!("{} lines", layout.lines().len());
//! # }
//! ```
use super::params::LayoutParams;
use super::progress::ProgressSink;
use super::timing::TimingBreakdown;
use crate::cache::{AnalysisCache, CachedAnalysis};
use crate::conditioner::{get_content_box, CorrectionReport, ImageConditioner};
use crate::fft::get_fft;
use crate::fonts::FontMetricsAnalyzer;
use crate::geometry::{BoundingBox, RectView};
use crate::image::{BrightnessGrid, PageImage};
use crate::layout::{Block, BlockStructurer, Line, Region, RegionTreeBuilder};
use crate::table::TableDetector;
use image::imageops::{self, FilterType};
use log::debug;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Result of analysing one page. Every rectangle is in pixels at
/// `analysis_dpi`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLayout {
    pub width: usize,
    pub height: usize,
    pub analysis_dpi: f32,
    pub source_dpi: f32,
    /// The conditioned grid was served from the analysis cache.
    pub from_cache: bool,
    pub correction: CorrectionReport,
    pub root: Region,
    pub timings: TimingBreakdown,
}

impl PageLayout {
    /// Atomic regions in reading order.
    pub fn leaves(&self) -> Vec<&Region> {
        self.root.leaves()
    }

    pub fn lines(&self) -> Vec<&Line> {
        self.root
            .leaves()
            .into_iter()
            .filter_map(|r| r.block.as_ref())
            .flat_map(|b| b.all_lines())
            .collect()
    }

    pub fn tables(&self) -> Vec<&Block> {
        self.root
            .leaves()
            .into_iter()
            .filter_map(|r| r.block.as_ref())
            .filter(|b| b.is_table)
            .collect()
    }

    pub fn word_count(&self) -> usize {
        self.lines().iter().map(|l| l.words.len()).sum()
    }

    /// Map a box from analysis resolution back to the source scan.
    pub fn to_source(&self, bbox: &BoundingBox) -> BoundingBox {
        bbox.rescale(self.analysis_dpi, self.source_dpi)
    }

    /// Leaf bounds at source resolution.
    pub fn source_boxes(&self) -> Vec<BoundingBox> {
        self.leaves()
            .into_iter()
            .filter_map(|r| r.bbox())
            .map(|b| self.to_source(&b))
            .collect()
    }
}

/// Top-level entry point: raster in, [`PageLayout`] out.
#[derive(Clone, Debug)]
pub struct PageAnalyzer {
    params: LayoutParams,
    conditioner: ImageConditioner,
    tree: RegionTreeBuilder,
    structurer: BlockStructurer,
    tables: TableDetector,
    fonts: FontMetricsAnalyzer,
    cache: Option<Arc<AnalysisCache>>,
}

impl Default for PageAnalyzer {
    fn default() -> Self {
        Self::new(LayoutParams::default())
    }
}

impl PageAnalyzer {
    pub fn new(params: LayoutParams) -> Self {
        Self {
            conditioner: ImageConditioner::new(params.conditioner.clone(), params.skew.clone()),
            tree: RegionTreeBuilder::new(params.tree.clone()),
            structurer: BlockStructurer::new(params.block.clone()),
            tables: TableDetector::new(params.table.clone()),
            fonts: FontMetricsAnalyzer::new(params.fonts.clone()),
            cache: None,
            params,
        }
    }

    /// Share conditioned grids and spectra through `cache` for keyed calls.
    pub fn with_cache(mut self, cache: Arc<AnalysisCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    pub fn cache(&self) -> Option<&Arc<AnalysisCache>> {
        self.cache.as_ref()
    }

    /// Analyse `page`. The page is downscaled to the analysis resolution
    /// when needed and its brightness grid is left conditioned.
    pub fn analyze(&self, page: &mut PageImage, progress: &dyn ProgressSink) -> PageLayout {
        self.run(None, page, progress)
    }

    /// As [`analyze`](Self::analyze), reusing cached results stored under
    /// `page_key`. Without a cache this is a plain `analyze`.
    pub fn analyze_keyed(&self, page_key: &str, page: &mut PageImage, progress: &dyn ProgressSink) -> PageLayout {
        self.run(Some(page_key), page, progress)
    }

    /// Forget everything cached for `page_key`; returns the number of
    /// dropped entries.
    pub fn invalidate(&self, page_key: &str) -> usize {
        match &self.cache {
            Some(cache) => cache.invalidate_prefix(&format!("{page_key}/")),
            None => 0,
        }
    }

    fn run(&self, key: Option<&str>, page: &mut PageImage, progress: &dyn ProgressSink) -> PageLayout {
        let total_start = Instant::now();
        let mut timings = TimingBreakdown::default();
        let source_dpi = page.dpi();

        let start = Instant::now();
        self.cap_resolution(page, progress);
        timings.push("resample", elapsed_ms(start));

        progress.status("conditioning page");
        let start = Instant::now();
        let (correction, from_cache) = match (key, &self.cache) {
            (Some(key), Some(cache)) => self.condition_cached(cache, key, page),
            _ => (self.conditioner.correct_page(page), false),
        };
        timings.push("condition", elapsed_ms(start));
        if correction.content_box.is_none() {
            progress.status("page has no content");
        } else if correction.rotated {
            progress.status(&format!(
                "corrected skew of {:.2} degrees",
                correction.skew_degrees.unwrap_or(0.0)
            ));
        }

        let dpi = page.dpi();
        let (width, height) = (page.width(), page.height());
        let grid = page.brightness();

        progress.status("building region tree");
        let start = Instant::now();
        let mut root = self.tree.build(&RectView::whole(grid), dpi);
        timings.push("region_tree", elapsed_ms(start));

        progress.status("structuring blocks");
        let start = Instant::now();
        self.structure_leaves(grid, &mut root, dpi, progress);
        timings.push("blocks", elapsed_ms(start));

        if self.params.analyze_fonts {
            progress.status("measuring fonts");
            let start = Instant::now();
            for leaf in root.leaves_mut() {
                if let Some(block) = leaf.block.as_mut() {
                    self.fonts.analyze_block(grid, block, dpi);
                }
            }
            timings.push("fonts", elapsed_ms(start));
        }

        timings.total_ms = elapsed_ms(total_start);
        debug!(
            "PageAnalyzer {}x{} @ {} dpi regions={} leaves={} cached={} latency_ms={:.3}",
            width,
            height,
            dpi,
            root.count(),
            root.leaves().len(),
            from_cache,
            timings.total_ms
        );
        progress.status("page analysed");

        PageLayout {
            width,
            height,
            analysis_dpi: dpi,
            source_dpi,
            from_cache,
            correction,
            root,
            timings,
        }
    }

    fn cap_resolution(&self, page: &mut PageImage, progress: &dyn ProgressSink) {
        let (dpi, cap) = (page.dpi(), self.params.max_analysis_dpi);
        if cap <= 0.0 || dpi <= cap || page.width() == 0 || page.height() == 0 {
            return;
        }
        let scale = cap / dpi;
        let w = ((page.width() as f32 * scale).round() as u32).max(1);
        let h = ((page.height() as f32 * scale).round() as u32).max(1);
        progress.status(&format!("downscaling {dpi} dpi page to {cap} dpi"));
        let resized = imageops::resize(page.raster(), w, h, FilterType::Lanczos3);
        page.replace_raster(resized, cap);
    }

    fn condition_cached(&self, cache: &AnalysisCache, key: &str, page: &mut PageImage) -> (CorrectionReport, bool) {
        let grid_key = format!("{key}/grid");
        if let Some(CachedAnalysis::Grid(grid)) = cache.get(&grid_key) {
            let correction = CorrectionReport {
                content_box: get_content_box(&grid),
                ..CorrectionReport::default()
            };
            *page.brightness_mut() = grid.as_ref().clone();
            return (correction, true);
        }

        let dpi = page.dpi();
        let mut grid = page.brightness().clone();
        let (dim, repeat) = (self.params.skew.spectrum_dim(), self.params.skew.repeat);
        let fft_key = format!("{key}/fft/{dim}");
        let correction = self.conditioner.correct_with_spectrum(&mut grid, dpi, |g| {
            let fresh = || Arc::new(get_fft(g, dim, dim, repeat));
            match cache.get_or_insert_with(&fft_key, || CachedAnalysis::Spectrum(fresh())) {
                CachedAnalysis::Spectrum(s) => s,
                CachedAnalysis::Grid(_) => fresh(),
            }
        });
        let grid = Arc::new(grid);
        let shared = match cache.get_or_insert_with(&grid_key, || CachedAnalysis::Grid(grid.clone())) {
            CachedAnalysis::Grid(g) => g,
            CachedAnalysis::Spectrum(_) => grid,
        };
        *page.brightness_mut() = shared.as_ref().clone();
        (correction, false)
    }

    fn structure_leaves(&self, grid: &BrightnessGrid, root: &mut Region, dpi: f32, progress: &dyn ProgressSink) {
        let whole = RectView::whole(grid);
        for leaf in root.leaves_mut() {
            let view = whole.with_rect(leaf.rect);
            let mut block = self.structurer.structure(&view, dpi);
            let probe = block.lines.is_empty()
                && self.params.detect_tables
                && self.tables.is_candidate(&leaf.rect, dpi);
            if probe {
                match self.tables.detect(&view, dpi, &self.structurer) {
                    Some(rows) => {
                        progress.status(&format!("table with {} rows at {:?}", rows.len(), leaf.rect));
                        block = Block::table(rows);
                    }
                    None => progress.status(&format!("block {:?} has no lines and no table", leaf.rect)),
                }
            }
            leaf.block = Some(block);
        }
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use std::sync::Mutex;

    fn square_page(side: usize, square: usize, dpi: f32) -> PageImage {
        let mut g = BrightnessGrid::new(side, side);
        let lo = (side - square) / 2;
        for y in lo..lo + square {
            for x in lo..lo + square {
                g.set(x, y, 0);
            }
        }
        PageImage::from_brightness(g, dpi)
    }

    #[test]
    fn blank_page_yields_empty_layout() {
        let seen = Mutex::new(Vec::<String>::new());
        let sink = |m: &str| seen.lock().unwrap().push(m.to_string());
        let mut page = PageImage::from_brightness(BrightnessGrid::new(100, 100), 100.0);
        let layout = PageAnalyzer::default().analyze(&mut page, &sink);
        assert!(layout.root.is_atomic);
        assert!(layout.lines().is_empty());
        assert!(layout.correction.content_box.is_none());
        let seen = seen.lock().unwrap();
        assert!(seen.iter().any(|m| m == "page has no content"), "{seen:?}");
        assert!(layout.timings.stage("condition").is_some());
    }

    #[test]
    fn high_resolution_pages_are_downscaled() {
        let mut page = PageImage::from_brightness(BrightnessGrid::new(200, 100), 600.0);
        let layout = PageAnalyzer::default().analyze(&mut page, &crate::pipeline::NoProgress);
        assert_eq!((layout.width, layout.height), (100, 50));
        assert_eq!(layout.analysis_dpi, 300.0);
        assert_eq!(layout.source_dpi, 600.0);
        assert_eq!(page.dpi(), 300.0);
        let b = Rect::new(0, 10, 0, 10).to_bbox().unwrap();
        assert_eq!(layout.to_source(&b), BoundingBox::new(0, 18, 0, 18));
    }

    #[test]
    fn keyed_analysis_reuses_and_invalidates_cache() {
        let cache = Arc::new(AnalysisCache::default());
        let analyzer = PageAnalyzer::default().with_cache(cache.clone());
        let progress = crate::pipeline::NoProgress;

        let first = analyzer.analyze_keyed("p1", &mut square_page(200, 20, 100.0), &progress);
        assert!(!first.from_cache);
        assert!(cache.contains("p1/grid"));
        assert!(cache.contains("p1/fft/256"));

        let second = analyzer.analyze_keyed("p1", &mut square_page(200, 20, 100.0), &progress);
        assert!(second.from_cache);
        assert_eq!(second.correction.content_box, first.correction.content_box);

        assert_eq!(analyzer.invalidate("p1"), 2);
        assert!(cache.is_empty());
        let third = analyzer.analyze_keyed("p1", &mut square_page(200, 20, 100.0), &progress);
        assert!(!third.from_cache);
    }

    #[test]
    fn odd_spectrum_size_is_rounded_up() {
        let mut params = LayoutParams::default();
        params.skew.fft_dim = 200;
        let cache = Arc::new(AnalysisCache::default());
        let analyzer = PageAnalyzer::new(params).with_cache(cache.clone());
        let layout = analyzer.analyze_keyed("odd", &mut square_page(200, 20, 100.0), &crate::pipeline::NoProgress);
        assert!(layout.correction.content_box.is_some());
        assert!(cache.contains("odd/fft/256"));
    }

    #[test]
    fn unkeyed_analysis_leaves_cache_alone() {
        let cache = Arc::new(AnalysisCache::default());
        let analyzer = PageAnalyzer::default().with_cache(cache.clone());
        analyzer.analyze(&mut square_page(200, 20, 100.0), &crate::pipeline::NoProgress);
        assert!(cache.is_empty());
    }
}
