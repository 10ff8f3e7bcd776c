//! Connected-component labeling and the speck removal built on it.
pub mod colorer;
pub mod dust;

pub use colorer::{color_regions, color_regions_in, RegionMap, RegionStats, BACKGROUND};
pub use dust::{feather_dust, DustParams, DustReport};
