//! Grid Occupancy Store
//!
//! Per-floor cell occupancy with stacking exceptions. At most one
//! non-stacking occupant may hold a cell on a given floor; stacking
//! occupants (walls, fences) form an unordered set per cell, and ground
//! tiles (pavement/grass/gravel) are silently evicted when a non-ground
//! object is placed over them. A stacking placement over a stacking
//! ground tile coexists with it instead (a fence on grass keeps the
//! grass).

use std::collections::HashMap;

use glam::Vec3;

use crate::assets::{AssetCategory, GridSize};
use crate::grid::coords::{CellMetrics, GridPosition};
use crate::objects::ObjectId;

/// One occupant of a cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellOccupant {
    /// Id of the placed object
    pub id: ObjectId,
    /// Category of the occupying asset
    pub category: AssetCategory,
    /// Whether the occupant permits stacking
    pub can_stack: bool,
}

/// Key of one occupied cell: (floor, cell).
pub type CellKey = (i32, GridPosition);

/// Tracks which object occupies which cell on which floor.
#[derive(Debug)]
pub struct OccupancyGrid {
    metrics: CellMetrics,
    /// Occupants per (floor, cell). Never holds empty vectors.
    cells: HashMap<CellKey, Vec<CellOccupant>>,
    /// Reverse index: object id -> every cell it occupies.
    by_id: HashMap<ObjectId, Vec<CellKey>>,
}

impl OccupancyGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            metrics: CellMetrics::new(cell_size),
            cells: HashMap::new(),
            by_id: HashMap::new(),
        }
    }

    /// Pure transform: cell -> world center point.
    pub fn grid_to_world(&self, pos: GridPosition) -> Vec3 {
        self.metrics.grid_to_world(pos)
    }

    /// Pure transform: world point -> containing cell.
    pub fn world_to_grid(&self, point: Vec3) -> GridPosition {
        self.metrics.world_to_grid(point)
    }

    pub fn metrics(&self) -> CellMetrics {
        self.metrics
    }

    /// Mark every cell of the `size` rectangle anchored at `pos` as
    /// occupied by `id` on `floor`.
    ///
    /// Ground-tile occupants under a non-ground placement are evicted and
    /// their ids returned so the caller can drop their objects; each
    /// evicted id has all of its cells cleared. When both the placement
    /// and the ground tile stack there is no eviction, they coexist, as
    /// stacking occupants do among themselves. Callers are expected to
    /// have validated the placement.
    pub fn mark_occupied(
        &mut self,
        id: &ObjectId,
        pos: GridPosition,
        size: GridSize,
        can_stack: bool,
        category: AssetCategory,
        floor: i32,
    ) -> Vec<ObjectId> {
        let mut evicted: Vec<ObjectId> = Vec::new();

        if !category.is_ground_tile() {
            for cell in rect_cells(pos, size) {
                if let Some(occupants) = self.cells.get(&(floor, cell)) {
                    for occupant in occupants {
                        if occupant.category.is_ground_tile()
                            && !(can_stack && occupant.can_stack)
                            && !evicted.contains(&occupant.id)
                        {
                            evicted.push(occupant.id.clone());
                        }
                    }
                }
            }
            for ground_id in &evicted {
                self.clear_occupied(ground_id);
            }
        }

        let keys = self.by_id.entry(id.clone()).or_default();
        for cell in rect_cells(pos, size) {
            let key = (floor, cell);
            self.cells.entry(key).or_default().push(CellOccupant {
                id: id.clone(),
                category,
                can_stack,
            });
            keys.push(key);
        }

        evicted
    }

    /// Would a placement of `size` at `pos` on `floor` collide with an
    /// existing occupant?
    pub fn is_occupied(
        &self,
        pos: GridPosition,
        size: GridSize,
        can_stack: bool,
        category: AssetCategory,
        floor: i32,
    ) -> bool {
        self.is_occupied_excluding(pos, size, can_stack, category, floor, &[])
    }

    /// Occupancy check that ignores the listed ids. Used while validating
    /// an in-progress move, where the moving object's own cells (and its
    /// shaft siblings') must not count against it.
    pub fn is_occupied_excluding(
        &self,
        pos: GridPosition,
        size: GridSize,
        can_stack: bool,
        category: AssetCategory,
        floor: i32,
        exclude: &[ObjectId],
    ) -> bool {
        for cell in rect_cells(pos, size) {
            let Some(occupants) = self.cells.get(&(floor, cell)) else {
                continue;
            };
            for occupant in occupants {
                if exclude.contains(&occupant.id) {
                    continue;
                }
                if blocks(occupant, can_stack, category) {
                    return true;
                }
            }
        }
        false
    }

    /// Remove every occupancy record for `id`, across all floors.
    ///
    /// An object only ever occupies one floor at a time, but cleanup is
    /// global for safety.
    pub fn clear_occupied(&mut self, id: &ObjectId) {
        let Some(keys) = self.by_id.remove(id) else {
            return;
        };
        for key in keys {
            if let Some(occupants) = self.cells.get_mut(&key) {
                occupants.retain(|o| &o.id != id);
                if occupants.is_empty() {
                    self.cells.remove(&key);
                }
            }
        }
    }

    /// Occupants of one cell on one floor.
    pub fn occupants_at(&self, floor: i32, cell: GridPosition) -> &[CellOccupant] {
        self.cells
            .get(&(floor, cell))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every cell currently occupied by `id`, as (floor, cell) pairs.
    pub fn cells_of(&self, id: &ObjectId) -> &[CellKey] {
        self.by_id.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of occupied cells (for diagnostics and tests).
    pub fn occupied_cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Snapshot of the occupancy map keyed by (floor, cell), used by the
    /// undo/redo round-trip property test to compare exact state.
    pub fn snapshot(&self) -> HashMap<CellKey, Vec<(ObjectId, AssetCategory)>> {
        let mut map: HashMap<CellKey, Vec<(ObjectId, AssetCategory)>> = HashMap::new();
        for (key, occupants) in &self.cells {
            let mut entries: Vec<(ObjectId, AssetCategory)> = occupants
                .iter()
                .map(|o| (o.id.clone(), o.category))
                .collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            map.insert(*key, entries);
        }
        map
    }
}

/// Does `occupant` exclude a new placement with the given stacking flag
/// and category?
fn blocks(occupant: &CellOccupant, can_stack: bool, category: AssetCategory) -> bool {
    // An existing ground tile never blocks a non-ground placement: it is
    // evicted at mark time instead.
    if occupant.category.is_ground_tile() && !category.is_ground_tile() {
        return false;
    }
    // Two stacking occupants coexist.
    if occupant.can_stack && can_stack {
        return false;
    }
    true
}

/// Cells of the `size` rectangle anchored at `pos`.
pub fn rect_cells(pos: GridPosition, size: GridSize) -> impl Iterator<Item = GridPosition> {
    (0..size.x.max(0))
        .flat_map(move |dx| (0..size.z.max(0)).map(move |dz| pos.offset(dx, dz)))
}
