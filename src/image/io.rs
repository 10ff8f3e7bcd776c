//! I/O helpers for page rasters and JSON results.
//!
//! - `load_page`: read a PNG/JPEG/TIFF/etc. into a grayscale [`PageImage`].
//! - `save_brightness_png`: write a brightness grid as an 8-bit PNG.
//! - `write_json_file`: pretty-print a serializable value to disk.
use super::{BrightnessGrid, PageImage};
use crate::error::{LayoutError, LayoutResult};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Load an image from disk and convert it to 8-bit grayscale.
pub fn load_page(path: &Path, dpi: f32) -> LayoutResult<PageImage> {
    let img = image::open(path).map_err(|source| LayoutError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(PageImage::from_dynamic(img, dpi))
}

/// Save a brightness grid as a grayscale PNG.
pub fn save_brightness_png(grid: &BrightnessGrid, path: &Path) -> LayoutResult<()> {
    ensure_parent_dir(path)?;
    grid.to_gray_image()
        .save(path)
        .map_err(|source| LayoutError::Image {
            path: path.to_path_buf(),
            source,
        })
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> LayoutResult<()> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).map_err(|source| LayoutError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn ensure_parent_dir(path: &Path) -> LayoutResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| LayoutError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(())
}
