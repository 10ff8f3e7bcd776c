//! Region tree construction by alternating column / row splits.
//!
//! The builder works on an arena of nodes and an explicit work stack. Each
//! node is split across the axis opposite to the one that produced it (the
//! root starts with columns); when that axis yields nothing the other one is
//! tried. Candidate children pass a set of rejection rules before they are
//! accepted. A depth and node-count budget keeps pathological pages (noise)
//! bounded.
use super::model::Region;
use crate::geometry::{Rect, RectView};
use crate::split::{split, Axis, SplitOptions};
use log::{debug, warn};
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct TreeOptions {
    /// Block split margin is `dpi / block_margin_divisor`.
    pub block_margin_divisor: f32,
    /// Shears tried for splits of regions at least `shear_min_inches` long
    /// along the cut.
    pub shear_candidates: Vec<f32>,
    pub shear_min_inches: f32,
    /// Regions thinner than `dpi / min_font_divisor` cannot hold text.
    pub min_font_divisor: f32,
    /// Solid blocks above one inch with a mean brightness below this are
    /// scanning artifacts.
    pub dark_block_mean: f32,
    /// Regions whose darkest pixel is brighter than this are smudges.
    pub faint_limit: u8,
    /// A region spanning this fraction of the page height (or width) while
    /// narrower than `dpi / stripe_width_divisor` is an edge stripe.
    pub stripe_span_fraction: f32,
    pub stripe_width_divisor: f32,
    /// `height / width` at which a region is suspiciously tall and narrow.
    pub tall_narrow_aspect: f32,
    /// Smaller regions (below `dpi / small_region_divisor` tall) are
    /// suspicious from this `height / width` on.
    pub small_high_aspect: f32,
    pub small_region_divisor: f32,
    pub max_depth: usize,
    pub max_regions: usize,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            block_margin_divisor: 10.0,
            shear_candidates: vec![0.0, 1.0, -1.0, 2.0, -2.0],
            shear_min_inches: 1.0,
            min_font_divisor: 36.0,
            dark_block_mean: 40.0,
            faint_limit: 96,
            stripe_span_fraction: 0.8,
            stripe_width_divisor: 6.0,
            tall_narrow_aspect: 6.0,
            small_high_aspect: 2.5,
            small_region_divisor: 2.0,
            max_depth: 48,
            max_regions: 20_000,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Rejection {
    DarkBlock,
    TooThin,
    Faint,
    EdgeStripe,
    NotText,
}

struct Node {
    rect: Rect,
    is_column: bool,
    is_atomic: bool,
    depth: usize,
    children: Vec<usize>,
}

#[derive(Clone, Debug)]
pub struct RegionTreeBuilder {
    options: TreeOptions,
}

impl RegionTreeBuilder {
    pub fn new(options: TreeOptions) -> Self {
        Self { options }
    }

    /// Build the region tree of the page held by `view`.
    ///
    /// A blank page yields a single atomic region covering the view.
    pub fn build(&self, view: &RectView<'_>, dpi: f32) -> Region {
        let Some(content) = view.trimmed() else {
            return Region::atomic(view.rect, false);
        };
        let opts = &self.options;
        let page = view.rect;
        let margin = px(dpi / opts.block_margin_divisor);

        let mut nodes = vec![Node {
            rect: content.rect,
            is_column: false,
            is_atomic: false,
            depth: 0,
            children: Vec::new(),
        }];
        let mut stack = vec![0usize];
        let mut budget_hit = false;
        let mut rejected = 0usize;

        while let Some(id) = stack.pop() {
            let (rect, is_column, depth) = (nodes[id].rect, nodes[id].is_column, nodes[id].depth);
            if depth >= opts.max_depth || nodes.len() >= opts.max_regions {
                budget_hit = true;
                nodes[id].is_atomic = true;
                continue;
            }
            let node_view = view.with_rect(rect);
            let primary = if is_column { Axis::Rows } else { Axis::Columns };
            let secondary = match primary {
                Axis::Rows => Axis::Columns,
                Axis::Columns => Axis::Rows,
            };
            let (axis, parts) = match self.split_best(&node_view, primary, margin, dpi) {
                parts if parts.len() > 1 => (primary, parts),
                _ => (secondary, self.split_best(&node_view, secondary, margin, dpi)),
            };
            if parts.len() < 2 {
                nodes[id].is_atomic = true;
                continue;
            }
            if nodes.len() + parts.len() > opts.max_regions {
                budget_hit = true;
                nodes[id].is_atomic = true;
                continue;
            }

            let mut children = Vec::with_capacity(parts.len());
            for part in &parts {
                if let Some(reason) = self.reject(part, &page, dpi) {
                    debug!("RegionTreeBuilder reject {:?} {:?}", part.rect, reason);
                    rejected += 1;
                    continue;
                }
                let child = nodes.len();
                nodes.push(Node {
                    rect: part.rect,
                    is_column: axis == Axis::Columns,
                    is_atomic: false,
                    depth: depth + 1,
                    children: Vec::new(),
                });
                children.push(child);
            }
            if children.is_empty() {
                nodes[id].is_atomic = true;
                continue;
            }
            // reverse so the first child is expanded first
            stack.extend(children.iter().rev().copied());
            nodes[id].children = children;
        }
        if budget_hit {
            warn!(
                "RegionTreeBuilder budget exhausted (max_depth={} max_regions={}); remaining nodes kept atomic",
                opts.max_depth, opts.max_regions
            );
        }
        debug!(
            "RegionTreeBuilder nodes={} rejected={} margin={}",
            nodes.len(),
            rejected,
            margin
        );
        assemble(nodes)
    }

    /// Split along `axis`, trying shear candidates for long cuts and keeping
    /// the variant with the most parts.
    fn split_best<'g>(&self, view: &RectView<'g>, axis: Axis, margin: usize, dpi: f32) -> Vec<RectView<'g>> {
        let along = match axis {
            Axis::Columns => view.height(),
            Axis::Rows => view.width(),
        };
        let base = SplitOptions::with_margin(margin);
        if (along as f32) < dpi * self.options.shear_min_inches {
            return split(view, axis, &base);
        }
        let mut best: Vec<RectView<'g>> = Vec::new();
        for &shear in &self.options.shear_candidates {
            let parts = split(view, axis, &base.clone().with_shear(shear));
            if parts.len() > best.len() {
                best = parts;
            }
        }
        if best.is_empty() {
            best.push(*view);
        }
        best
    }

    fn reject(&self, part: &RectView<'_>, page: &Rect, dpi: f32) -> Option<Rejection> {
        let opts = &self.options;
        let (w, h) = (part.width() as f32, part.height() as f32);
        if w > dpi && h > dpi && part.mean_brightness() < opts.dark_block_mean {
            return Some(Rejection::DarkBlock);
        }
        if h.min(w) < dpi / opts.min_font_divisor {
            return Some(Rejection::TooThin);
        }
        if part.min_brightness() > opts.faint_limit {
            return Some(Rejection::Faint);
        }
        let stripe_width = dpi / opts.stripe_width_divisor;
        let spans_height = h >= opts.stripe_span_fraction * page.height() as f32 && w < stripe_width;
        let spans_width = w >= opts.stripe_span_fraction * page.width() as f32 && h < stripe_width;
        if spans_height || spans_width {
            return Some(Rejection::EdgeStripe);
        }
        let tall_narrow = h >= opts.tall_narrow_aspect * w;
        let small_tall = h < dpi / opts.small_region_divisor && h >= opts.small_high_aspect * w;
        if (tall_narrow || small_tall) && !splits_into_lines(part) {
            return Some(Rejection::NotText);
        }
        None
    }
}

impl Default for RegionTreeBuilder {
    fn default() -> Self {
        Self::new(TreeOptions::default())
    }
}

/// Probe with a one-pixel row margin: does the region hold at least two
/// lines of something?
fn splits_into_lines(view: &RectView<'_>) -> bool {
    split(view, Axis::Rows, &SplitOptions::with_margin(1)).len() >= 2
}

pub(crate) fn px(value: f32) -> usize {
    (value.round() as usize).max(1)
}

/// Fold the arena into nested regions. Children always have larger ids
/// than their parent, so a reverse sweep sees every child first.
fn assemble(nodes: Vec<Node>) -> Region {
    let mut built: Vec<Option<Region>> = (0..nodes.len()).map(|_| None).collect();
    for id in (0..nodes.len()).rev() {
        let node = &nodes[id];
        let mut children: Vec<Region> = node
            .children
            .iter()
            .filter_map(|&c| built[c].take())
            .collect();
        let region = if children.len() == 1 && children[0].is_atomic {
            let only = children.remove(0);
            Region::atomic(only.rect, node.is_column)
        } else if children.is_empty() {
            Region::atomic(node.rect, node.is_column)
        } else {
            let rect = Rect::hull_all(children.iter().map(|c| &c.rect)).unwrap_or(node.rect);
            Region {
                rect,
                is_column: node.is_column,
                is_atomic: node.is_atomic,
                children,
                block: None,
            }
        };
        built[id] = Some(region);
    }
    built
        .into_iter()
        .next()
        .flatten()
        .unwrap_or_else(|| Region::atomic(Rect::default(), false))
}
