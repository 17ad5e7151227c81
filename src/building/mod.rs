//! Building Module
//!
//! Footprint rectangles, the building/floor registry, and derived wall
//! geometry with opening bookkeeping.

pub mod footprint;
pub mod registry;
pub mod walls;

pub use footprint::{Footprint, cover_cells};
pub use registry::{Building, BuildingId, BuildingOpError, BuildingRegistry, Floor};
pub use walls::{WALL_THICKNESS_RATIO, WallAxis, WallId, WallSegment, WallSet};
