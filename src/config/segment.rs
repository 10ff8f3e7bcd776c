//! JSON configuration of the `page_segmenter` command-line tool.
//!
//! ```json
//! {
//!   "inputs": ["scans/page-001.png", "scans/page-002.png"],
//!   "dpi": 300,
//!   "output": { "json_dir": "out/json", "corrected_dir": "out/corrected" },
//!   "params": { "max_analysis_dpi": 300, "skew": { "enabled": true } }
//! }
//! ```
use crate::error::{LayoutError, LayoutResult};
use crate::pipeline::LayoutParams;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// One `<stem>.json` layout per input page.
    pub json_dir: Option<PathBuf>,
    /// One `<stem>.png` conditioned raster per input page.
    pub corrected_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RuntimeConfig {
    pub inputs: Vec<PathBuf>,
    /// Scan resolution of the inputs.
    #[serde(default = "default_dpi")]
    pub dpi: f32,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub params: LayoutParams,
}

fn default_dpi() -> f32 {
    300.0
}

impl RuntimeConfig {
    /// Parse and validate a config; `origin` names the source in errors.
    pub fn from_json(text: &str, origin: &Path) -> LayoutResult<Self> {
        let invalid = |message: String| LayoutError::Config {
            path: origin.to_path_buf(),
            message,
        };
        let config: RuntimeConfig = serde_json::from_str(text).map_err(|e| invalid(e.to_string()))?;
        if config.inputs.is_empty() {
            return Err(invalid("no input pages listed".to_string()));
        }
        if config.dpi.is_nan() || config.dpi <= 0.0 {
            return Err(invalid(format!("dpi must be positive, got {}", config.dpi)));
        }
        let fft_dim = config.params.skew.fft_dim;
        if !fft_dim.is_power_of_two() {
            return Err(invalid(format!("skew.fft_dim must be a power of two, got {fft_dim}")));
        }
        Ok(config)
    }

    pub fn json_path(&self, input: &Path) -> Option<PathBuf> {
        self.output.json_dir.as_ref().map(|dir| dir.join(output_name(input, "json")))
    }

    pub fn corrected_path(&self, input: &Path) -> Option<PathBuf> {
        self.output
            .corrected_dir
            .as_ref()
            .map(|dir| dir.join(output_name(input, "png")))
    }
}

fn output_name(input: &Path, ext: &str) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "page".to_string());
    format!("{stem}.{ext}")
}

pub fn load_config(path: &Path) -> LayoutResult<RuntimeConfig> {
    let contents = fs::read_to_string(path).map_err(|e| LayoutError::Config {
        path: path.to_path_buf(),
        message: format!("cannot read: {e}"),
    })?;
    RuntimeConfig::from_json(&contents, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg = RuntimeConfig::from_json(r#"{ "inputs": ["a/page-1.png"] }"#, Path::new("cfg.json"))
            .expect("valid config");
        assert_eq!(cfg.dpi, 300.0);
        assert!(cfg.json_path(&cfg.inputs[0]).is_none());
        assert!(cfg.params.detect_tables);
    }

    #[test]
    fn output_paths_follow_input_stem() {
        let text = r#"{
            "inputs": ["scans/page-1.png"],
            "dpi": 200,
            "output": { "json_dir": "out", "corrected_dir": "fixed" }
        }"#;
        let cfg = RuntimeConfig::from_json(text, Path::new("cfg.json")).expect("valid config");
        let input = &cfg.inputs[0];
        assert_eq!(cfg.json_path(input), Some(PathBuf::from("out/page-1.json")));
        assert_eq!(cfg.corrected_path(input), Some(PathBuf::from("fixed/page-1.png")));
    }

    #[test]
    fn bad_configs_are_config_errors() {
        for text in [
            r#"{ "inputs": [] }"#,
            r#"{ "inputs": ["a.png"], "dpi": 0 }"#,
            r#"{ "inputs": ["a.png"], "params": { "skew": { "fft_dim": 200 } } }"#,
            r#"{ "inputs": ["a.png"], "params": { "skew": { "fft_dim": 0 } } }"#,
            "not json",
        ] {
            match RuntimeConfig::from_json(text, Path::new("bad.json")) {
                Err(LayoutError::Config { path, .. }) => assert_eq!(path, PathBuf::from("bad.json")),
                other => panic!("expected config error for {text:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = load_config(Path::new("/nonexistent/page_segmenter.json")).unwrap_err();
        assert!(matches!(err, LayoutError::Config { .. }));
    }
}
