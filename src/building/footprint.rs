//! Building Footprints
//!
//! Rectangular cell regions. A building may be non-convex and is then
//! represented as a list of rectangles; bounds are inclusive on both ends
//! so `{min_x: 0, max_x: 2}` spans cells 0, 1 and 2.

use serde::{Deserialize, Serialize};

use crate::assets::GridSize;
use crate::grid::GridPosition;

/// One rectangular cell region of a building (inclusive bounds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Footprint {
    pub min_x: i32,
    pub max_x: i32,
    pub min_z: i32,
    pub max_z: i32,
}

impl Footprint {
    /// Create a footprint, normalizing swapped bounds.
    pub fn new(min_x: i32, max_x: i32, min_z: i32, max_z: i32) -> Self {
        Self {
            min_x: min_x.min(max_x),
            max_x: min_x.max(max_x),
            min_z: min_z.min(max_z),
            max_z: min_z.max(max_z),
        }
    }

    /// Footprint of a `size` rectangle anchored at `pos` (minimum corner).
    pub fn from_anchor(pos: GridPosition, size: GridSize) -> Self {
        Self {
            min_x: pos.x,
            max_x: pos.x + size.x.max(1) - 1,
            min_z: pos.z,
            max_z: pos.z + size.z.max(1) - 1,
        }
    }

    /// Cells along X.
    pub fn width(&self) -> i32 {
        self.max_x - self.min_x + 1
    }

    /// Cells along Z.
    pub fn depth(&self) -> i32 {
        self.max_z - self.min_z + 1
    }

    pub fn cell_count(&self) -> i32 {
        self.width() * self.depth()
    }

    /// Does this footprint contain the cell?
    pub fn contains(&self, x: i32, z: i32) -> bool {
        x >= self.min_x && x <= self.max_x && z >= self.min_z && z <= self.max_z
    }

    /// Do two footprints share at least one cell?
    pub fn intersects(&self, other: &Footprint) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_z <= other.max_z
            && self.max_z >= other.min_z
    }

    /// Footprint shifted by a cell delta.
    pub fn translated(&self, dx: i32, dz: i32) -> Self {
        Self {
            min_x: self.min_x + dx,
            max_x: self.max_x + dx,
            min_z: self.min_z + dz,
            max_z: self.max_z + dz,
        }
    }

    /// Every cell in the rectangle.
    pub fn cells(&self) -> impl Iterator<Item = GridPosition> + '_ {
        (self.min_x..=self.max_x)
            .flat_map(move |x| (self.min_z..=self.max_z).map(move |z| GridPosition::new(x, z)))
    }
}

/// Re-cover an arbitrary cell set with rectangles.
///
/// Used after partial demolition: removing cells from a rectangle leaves a
/// region that must go back into footprint form. Greedy: maximal runs per
/// row, then merge vertically adjacent runs with identical x-extent.
pub fn cover_cells(cells: &std::collections::HashSet<GridPosition>) -> Vec<Footprint> {
    if cells.is_empty() {
        return Vec::new();
    }

    let mut rows: Vec<i32> = cells.iter().map(|c| c.z).collect();
    rows.sort_unstable();
    rows.dedup();

    // Maximal horizontal runs per row: (min_x, max_x, z).
    let mut runs: Vec<(i32, i32, i32)> = Vec::new();
    for &z in &rows {
        let mut xs: Vec<i32> = cells.iter().filter(|c| c.z == z).map(|c| c.x).collect();
        xs.sort_unstable();
        let mut start = xs[0];
        let mut prev = xs[0];
        for &x in &xs[1..] {
            if x != prev + 1 {
                runs.push((start, prev, z));
                start = x;
            }
            prev = x;
        }
        runs.push((start, prev, z));
    }

    // Merge runs with identical x-extent on consecutive rows.
    let mut footprints: Vec<Footprint> = Vec::new();
    let mut open: Vec<(i32, i32, i32, i32)> = Vec::new(); // (min_x, max_x, min_z, max_z)
    for (min_x, max_x, z) in runs {
        if let Some(slot) = open
            .iter_mut()
            .find(|o| o.0 == min_x && o.1 == max_x && o.3 == z - 1)
        {
            slot.3 = z;
        } else {
            open.push((min_x, max_x, z, z));
        }
    }
    for (min_x, max_x, min_z, max_z) in open {
        footprints.push(Footprint::new(min_x, max_x, min_z, max_z));
    }
    footprints
}
