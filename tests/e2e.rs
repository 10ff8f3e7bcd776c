mod common;

use common::synthetic_image::{blank, centered_square, noise, ruled_table, text_block};
use page_segmenter::conditioner::{get_content_box, ImageConditioner};
use page_segmenter::image::{PageImage, WHITE};
use page_segmenter::layout::TreeOptions;
use page_segmenter::pipeline::{LayoutParams, NoProgress, PageAnalyzer};
use page_segmenter::regions::color_regions;
use page_segmenter::{BoundingBox, Rect};
use std::sync::Mutex;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Pipeline parameters for axis-aligned synthetic pages.
fn upright_params() -> LayoutParams {
    let mut params = LayoutParams::default();
    params.skew.enabled = false;
    params
}

#[test]
fn blank_page_survives_conditioning_unchanged() {
    init_logging();
    let mut grid = blank(100, 100);
    let report = ImageConditioner::default().correct(&mut grid, 100.0);
    assert_eq!(grid, blank(100, 100), "blank page must not be modified");
    assert!(!report.inverted);
    assert!(!report.blurry);
    assert!(!report.rotated);
    assert!(report.content_box.is_none());
}

#[test]
fn single_square_is_one_region_with_tight_content_box() {
    let (grid, square) = centered_square(200, 20);
    let content = get_content_box(&grid).expect("square has content");
    for (got, want) in [
        (content.left, square.left),
        (content.right, square.right),
        (content.top, square.top),
        (content.bottom, square.bottom),
    ] {
        assert!(got.abs_diff(want) <= 1, "content box {content:?} vs square {square:?}");
    }

    let map = color_regions(&grid, WHITE as i32, false);
    assert_eq!(map.len(), 1);
    assert_eq!(map.regions[0].size, 400);
}

#[test]
fn single_square_page_has_one_leaf() {
    let (grid, square) = centered_square(200, 20);
    let mut page = PageImage::from_brightness(grid, 100.0);
    let layout = PageAnalyzer::new(upright_params()).analyze(&mut page, &NoProgress);
    let leaves = layout.leaves();
    assert_eq!(leaves.len(), 1);
    assert_eq!(leaves[0].rect, square);
}

#[test]
fn degenerate_and_noisy_pages_terminate() {
    init_logging();
    let analyzer = PageAnalyzer::default();

    let mut tiny = blank(1, 1);
    tiny.set(0, 0, 0);
    let layout = analyzer.analyze(&mut PageImage::from_brightness(tiny, 100.0), &NoProgress);
    assert!(layout.root.is_atomic);

    let mut page = PageImage::from_brightness(noise(120, 120, 7), 100.0);
    let layout = analyzer.analyze(&mut page, &NoProgress);
    assert!(layout.root.count() <= TreeOptions::default().max_regions);
}

#[test]
fn ruled_table_is_rebuilt_cell_by_cell() {
    init_logging();
    let (rows, cols) = (3, 4);
    let mut page = PageImage::from_brightness(ruled_table(rows, cols, 60, 40), 100.0);
    let seen = Mutex::new(Vec::<String>::new());
    let sink = |m: &str| seen.lock().unwrap().push(m.to_string());
    let layout = PageAnalyzer::new(upright_params()).analyze(&mut page, &sink);

    let tables = layout.tables();
    assert_eq!(tables.len(), 1, "{:#?}", layout.root);
    let table = tables[0];
    assert_eq!(table.rows.len(), rows);
    for row in &table.rows {
        assert_eq!(row.cells.len(), cols);
        assert!(row.cells.iter().all(|c| c.col_span == 1 && c.row_span == 1));
    }
    let cells: usize = table.rows.iter().map(|r| r.cells.len()).sum();
    assert_eq!(cells, rows * cols);
    assert!(seen.lock().unwrap().iter().any(|m| m.starts_with("table with 3 rows")));
}

#[test]
fn text_page_yields_lines_words_and_sizes() {
    init_logging();
    let mut grid = blank(300, 150);
    text_block(&mut grid, 10, 10, 3, 4);
    let mut page = PageImage::from_brightness(grid, 300.0);
    let layout = PageAnalyzer::new(upright_params()).analyze(&mut page, &NoProgress);

    let lines = layout.lines();
    assert_eq!(lines.len(), 3);
    assert_eq!(layout.word_count(), 12);
    assert!(layout.tables().is_empty());
    assert_eq!(lines[0].words[0].rect, Rect::new(10, 58, 10, 30));
    for line in &lines {
        assert_eq!(line.words.len(), 4);
        let size = line.font_size.expect("solid glyphs have a point size");
        assert!((6.5..7.8).contains(&size), "point size {size}");
    }
    assert_eq!(lines[0].words[0].baseline, Some(29));
}

#[test]
fn layout_boxes_round_trip_through_text_and_binary() {
    let mut grid = blank(300, 150);
    text_block(&mut grid, 10, 10, 3, 4);
    let mut page = PageImage::from_brightness(grid, 300.0);
    let layout = PageAnalyzer::new(upright_params()).analyze(&mut page, &NoProgress);

    let boxes: Vec<BoundingBox> = layout
        .lines()
        .iter()
        .flat_map(|l| l.words.iter().filter_map(|w| w.bbox()))
        .collect();
    assert_eq!(boxes.len(), 12);

    let text: String = boxes.iter().map(|b| b.to_string()).collect();
    assert_eq!(BoundingBox::parse_many(&text).expect("parse"), boxes);

    let mut bytes = Vec::new();
    for b in &boxes {
        b.write_to(&mut bytes).expect("write");
    }
    let mut cursor = bytes.as_slice();
    for b in &boxes {
        assert_eq!(&BoundingBox::read_from(&mut cursor).expect("read"), b);
    }

    let hull = BoundingBox::aggregate(boxes.iter().map(Some)).expect("non-empty");
    assert!(boxes.iter().all(|b| hull.contains(b)));
}

#[test]
fn layout_serializes_to_json() {
    let (grid, _) = centered_square(200, 20);
    let mut page = PageImage::from_brightness(grid, 100.0);
    let layout = PageAnalyzer::new(upright_params()).analyze(&mut page, &NoProgress);
    let json = serde_json::to_value(&layout).expect("serializable");
    assert_eq!(json["analysisDpi"], 100.0);
    assert!(json["root"]["rect"].is_object());
    assert!(json["timings"]["stages"].as_array().is_some_and(|s| !s.is_empty()));
}
