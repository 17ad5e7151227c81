//! Grid Coordinates & Transforms
//!
//! Bidirectional mapping between integer grid cells and continuous world
//! coordinates. Only integers are valid cell indices; the floor is a
//! separate axis and never part of a grid position.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::assets::GridSize;

/// Integer cell coordinates on the active floor.
///
/// Serde ignores a stray `y` field found in legacy documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: i32,
    pub z: i32,
}

impl GridPosition {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Position shifted by a cell delta.
    pub fn offset(&self, dx: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            z: self.z + dz,
        }
    }
}

/// Facing of a placed object; rotation is in 90-degree increments only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    North,
    East,
    South,
    West,
}

impl Orientation {
    /// Next orientation clockwise.
    pub fn rotated_cw(&self) -> Self {
        match self {
            Orientation::North => Orientation::East,
            Orientation::East => Orientation::South,
            Orientation::South => Orientation::West,
            Orientation::West => Orientation::North,
        }
    }

    /// Next orientation counter-clockwise.
    pub fn rotated_ccw(&self) -> Self {
        match self {
            Orientation::North => Orientation::West,
            Orientation::West => Orientation::South,
            Orientation::South => Orientation::East,
            Orientation::East => Orientation::North,
        }
    }

    /// Is this a 90-degree rotation from the default facing?
    pub fn is_rotated(&self) -> bool {
        matches!(self, Orientation::East | Orientation::West)
    }

    /// Footprint size with the rotation applied: East/West swap x and z.
    pub fn footprint_size(&self, size: GridSize) -> GridSize {
        if self.is_rotated() { size.swapped() } else { size }
    }

    /// Yaw in radians for consumers that orient visuals (north = 0).
    pub fn yaw_radians(&self) -> f32 {
        match self {
            Orientation::North => 0.0,
            Orientation::East => std::f32::consts::FRAC_PI_2,
            Orientation::South => std::f32::consts::PI,
            Orientation::West => 3.0 * std::f32::consts::FRAC_PI_2,
        }
    }
}

/// Pure grid/world coordinate transforms for a given cell size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellMetrics {
    /// World size of one cell (meters)
    pub cell_size: f32,
}

impl CellMetrics {
    pub fn new(cell_size: f32) -> Self {
        Self { cell_size }
    }

    /// World position of a cell's center (y = 0; floors are handled by the
    /// caller via floor heights).
    pub fn grid_to_world(&self, pos: GridPosition) -> Vec3 {
        let half = self.cell_size / 2.0;
        Vec3::new(
            pos.x as f32 * self.cell_size + half,
            0.0,
            pos.z as f32 * self.cell_size + half,
        )
    }

    /// Cell containing a world point.
    pub fn world_to_grid(&self, point: Vec3) -> GridPosition {
        GridPosition {
            x: (point.x / self.cell_size).floor() as i32,
            z: (point.z / self.cell_size).floor() as i32,
        }
    }

    /// World-space bounds (min, max) of a footprint anchored at `pos`.
    ///
    /// The anchor is the minimum-corner cell; the rectangle spans
    /// `size.x` by `size.z` cells.
    pub fn footprint_bounds(&self, pos: GridPosition, size: GridSize) -> (Vec3, Vec3) {
        let min = Vec3::new(
            pos.x as f32 * self.cell_size,
            0.0,
            pos.z as f32 * self.cell_size,
        );
        let max = Vec3::new(
            (pos.x + size.x) as f32 * self.cell_size,
            0.0,
            (pos.z + size.z) as f32 * self.cell_size,
        );
        (min, max)
    }
}
