//! Pixel geometry: absolute bounding boxes and grid-backed rectangle views.
pub mod bbox;
pub mod rect;

pub use bbox::BoundingBox;
pub use rect::{Rect, RectView};
