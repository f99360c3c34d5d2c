//! Spatial indexing over the map plane

pub mod grid;
pub mod map_grid;

pub use grid::Grid;
pub use map_grid::{GridCell, SpatialIndex};
