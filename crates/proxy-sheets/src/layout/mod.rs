//! Layout calculation for proxy sheets
//!
//! This module handles all the geometric calculations for a sheet run:
//! - Sheet geometry (centered grid, cell bounds, cut guides, footer anchors)
//! - Pagination (row-major fronts, column-mirrored backs)

mod grid;
mod page;
mod types;

pub use grid::*;
pub use page::*;
pub use types::*;
