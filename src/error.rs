//! Error type shared by the codecs, I/O helpers and the CLI.
//!
//! Analysis itself never fails: degenerate inputs produce neutral results.
//! Only malformed external data (bounding-box text or records, images,
//! configuration files) surfaces as a [`LayoutError`].
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayoutError {
    /// Bounding-box text that is neither empty nor `[l,r,t,b]`-shaped.
    #[error("invalid bounding box format: {0:?}")]
    InvalidFormat(String),
    /// Binary bounding-box record shorter than the fixed record size.
    #[error("truncated bounding box record: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("failed to process image {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
    #[error("json serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub type LayoutResult<T> = Result<T, LayoutError>;
