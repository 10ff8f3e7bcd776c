//! Structural decomposition: the region tree and block segmentation.
//!
//! [`RegionTreeBuilder`] cuts the conditioned page into nested regions;
//! [`BlockStructurer`] turns each atomic region into lines and words.
pub mod block;
pub mod model;
pub mod tree;

pub use block::{BlockOptions, BlockStructurer};
pub use model::{Block, Line, Region, TableCell, TableRow, Word};
pub use tree::{RegionTreeBuilder, TreeOptions};
