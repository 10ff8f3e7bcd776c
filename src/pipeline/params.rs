//! Aggregated parameters of the page analysis pipeline.
use crate::conditioner::{ConditionerOptions, SkewOptions};
use crate::fonts::FontOptions;
use crate::layout::{BlockOptions, TreeOptions};
use crate::table::TableOptions;
use serde::Deserialize;

/// Every tunable of [`PageAnalyzer`](super::PageAnalyzer), grouped by stage.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LayoutParams {
    /// Pages scanned above this resolution are downscaled before analysis.
    pub max_analysis_dpi: f32,
    pub conditioner: ConditionerOptions,
    pub skew: SkewOptions,
    pub tree: TreeOptions,
    pub block: BlockOptions,
    pub table: TableOptions,
    pub fonts: FontOptions,
    /// Probe line-less blocks for ruled tables.
    pub detect_tables: bool,
    /// Estimate baselines, point sizes and styles.
    pub analyze_fonts: bool,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            max_analysis_dpi: 300.0,
            conditioner: ConditionerOptions::default(),
            skew: SkewOptions::default(),
            tree: TreeOptions::default(),
            block: BlockOptions::default(),
            table: TableOptions::default(),
            fonts: FontOptions::default(),
            detect_tables: true,
            analyze_fonts: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let json = r#"{ "max_analysis_dpi": 200.0, "skew": { "enabled": false }, "detect_tables": false }"#;
        let p: LayoutParams = serde_json::from_str(json).expect("params parse");
        assert_eq!(p.max_analysis_dpi, 200.0);
        assert!(!p.skew.enabled);
        assert!(!p.detect_tables);
        assert!(p.analyze_fonts);
        assert_eq!(p.skew.fft_dim, SkewOptions::default().fft_dim);
    }
}
