//! Grid Module
//!
//! Integer cell coordinates, grid/world transforms, and the per-floor
//! occupancy store.

pub mod coords;
pub mod occupancy;

pub use coords::{CellMetrics, GridPosition, Orientation};
pub use occupancy::{CellKey, CellOccupant, OccupancyGrid, rect_cells};
