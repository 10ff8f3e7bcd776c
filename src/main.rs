use page_segmenter::cache::AnalysisCache;
use page_segmenter::config::segment::{load_config, RuntimeConfig};
use page_segmenter::error::LayoutResult;
use page_segmenter::image::io::{load_page, save_brightness_png, write_json_file};
use page_segmenter::pipeline::{LogProgress, PageAnalyzer, PageLayout};
use rayon::prelude::*;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| "page_segmenter".to_string());
    let Some(config_path) = args.next() else {
        return Err(format!("Usage: {program} <config.json>"));
    };
    let config = load_config(Path::new(&config_path)).map_err(|e| e.to_string())?;

    let analyzer = PageAnalyzer::new(config.params.clone()).with_cache(Arc::new(AnalysisCache::default()));
    let results: Vec<(PathBuf, LayoutResult<PageLayout>)> = config
        .inputs
        .par_iter()
        .map(|input| (input.clone(), process_page(&analyzer, &config, input)))
        .collect();

    let mut failed = 0usize;
    for (input, result) in &results {
        match result {
            Ok(layout) => print_summary(input, layout),
            Err(err) => {
                eprintln!("{}: {err}", input.display());
                failed += 1;
            }
        }
    }
    println!("{} pages processed, {} failed", results.len(), failed);
    if failed > 0 {
        return Err(format!("{failed} page(s) failed"));
    }
    Ok(())
}

fn process_page(analyzer: &PageAnalyzer, config: &RuntimeConfig, input: &Path) -> LayoutResult<PageLayout> {
    let mut page = load_page(input, config.dpi)?;
    let key = input.to_string_lossy();
    let layout = analyzer.analyze_keyed(&key, &mut page, &LogProgress);
    if let Some(path) = config.json_path(input) {
        write_json_file(&path, &layout)?;
    }
    if let (Some(path), Some(grid)) = (config.corrected_path(input), page.cached_brightness()) {
        save_brightness_png(grid, &path)?;
    }
    Ok(layout)
}

fn print_summary(input: &Path, layout: &PageLayout) {
    println!(
        "{}: {}x{} @ {} dpi, {} regions, {} lines, {} words, {} tables, {:.1} ms",
        input.display(),
        layout.width,
        layout.height,
        layout.analysis_dpi,
        layout.leaves().len(),
        layout.lines().len(),
        layout.word_count(),
        layout.tables().len(),
        layout.timings.total_ms
    );
    if let Some(skew) = layout.correction.skew_degrees {
        println!("  skew {:.2} deg, rotated={}", skew, layout.correction.rotated);
    }
}
