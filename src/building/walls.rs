//! Wall Segments & Openings
//!
//! Walls are derived geometry: whenever a building's footprint changes
//! (create, merge, translate, demolition) its wall segments are
//! regenerated from the boundary of the footprint-cell union. A cell edge
//! is a wall edge exactly when the cell is inside the building and its
//! neighbor is not; collinear unit edges merge into segments.
//!
//! Doors and windows register as openings against a wall id. Ids derive
//! from the segment's geometry, so a wall untouched by an edit keeps its
//! id (and its openings) across regeneration and across sessions.
//! Regeneration reports the opening objects whose wall vanished so the
//! facade can clear their attachments.

use std::collections::{HashMap, HashSet};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::grid::GridPosition;
use crate::objects::ObjectId;

/// Wall slab thickness as a fraction of the cell size.
///
/// A rendering heuristic, not an exact contract; hosts can tune it via
/// `EditorConfig::wall_thickness_ratio`.
pub const WALL_THICKNESS_RATIO: f32 = 0.15;

/// Identifier of a wall segment, derived from (building, floor, axis,
/// line, span). Deterministic: the same geometry always yields the same
/// id, so persisted wall attachments survive regeneration.
pub type WallId = String;

/// Axis a wall segment runs along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WallAxis {
    /// Runs along X, at a constant Z grid line
    X,
    /// Runs along Z, at a constant X grid line
    Z,
}

/// One straight wall segment on a building boundary.
///
/// The segment lies on the grid line `line` (the boundary between cell
/// index `line - 1` and `line` on the perpendicular axis) and spans cell
/// indices `start..end` (exclusive) along its axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallSegment {
    pub id: WallId,
    pub building_id: String,
    pub floor: i32,
    pub axis: WallAxis,
    pub line: i32,
    pub start: i32,
    pub end: i32,
}

impl WallSegment {
    /// Segment length in cells.
    pub fn len_cells(&self) -> i32 {
        self.end - self.start
    }

    /// World-space centerline endpoints on the ground plane (x, z).
    pub fn world_centerline(&self, cell_size: f32) -> (Vec2, Vec2) {
        match self.axis {
            WallAxis::X => (
                Vec2::new(self.start as f32 * cell_size, self.line as f32 * cell_size),
                Vec2::new(self.end as f32 * cell_size, self.line as f32 * cell_size),
            ),
            WallAxis::Z => (
                Vec2::new(self.line as f32 * cell_size, self.start as f32 * cell_size),
                Vec2::new(self.line as f32 * cell_size, self.end as f32 * cell_size),
            ),
        }
    }

    /// Does this wall's centerline fall strictly inside the given world
    /// rectangle?
    ///
    /// The slab half-thickness is the tolerance: a centerline within it of
    /// the rectangle edge counts as touching, not crossing, so doors can
    /// sit flush against a wall. `min`/`max` are (x, z) world bounds.
    pub fn crosses_rect(&self, min: Vec2, max: Vec2, cell_size: f32, thickness_ratio: f32) -> bool {
        let half_slab = cell_size * thickness_ratio / 2.0;
        let (a, b) = self.world_centerline(cell_size);
        match self.axis {
            WallAxis::X => {
                let wall_z = a.y;
                wall_z > min.y + half_slab
                    && wall_z < max.y - half_slab
                    && a.x < max.x - half_slab
                    && b.x > min.x + half_slab
            }
            WallAxis::Z => {
                let wall_x = a.x;
                wall_x > min.x + half_slab
                    && wall_x < max.x - half_slab
                    && a.y < max.y - half_slab
                    && b.y > min.y + half_slab
            }
        }
    }

    /// World point at a normalized position (0..1) along the centerline.
    pub fn point_at(&self, position: f32, cell_size: f32) -> Vec2 {
        let (a, b) = self.world_centerline(cell_size);
        a + (b - a) * position.clamp(0.0, 1.0)
    }
}

/// All wall segments in the facility, with opening bookkeeping.
#[derive(Debug, Default)]
pub struct WallSet {
    segments: HashMap<WallId, WallSegment>,
    by_building: HashMap<String, Vec<WallId>>,
    /// Opening objects (doors/windows) attached per wall.
    openings: HashMap<WallId, Vec<ObjectId>>,
}

impl WallSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&WallSegment> {
        self.segments.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.segments.contains_key(id)
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Segments on one floor (validator scan).
    pub fn segments_on_floor(&self, floor: i32) -> impl Iterator<Item = &WallSegment> {
        self.segments.values().filter(move |s| s.floor == floor)
    }

    /// Segments belonging to one building.
    pub fn segments_of_building(&self, building_id: &str) -> Vec<&WallSegment> {
        self.by_building
            .get(building_id)
            .map(|ids| ids.iter().filter_map(|id| self.segments.get(id)).collect())
            .unwrap_or_default()
    }

    /// Attach an opening object to a wall. Returns false for an unknown
    /// wall id.
    pub fn register_opening(&mut self, wall_id: &str, object_id: &ObjectId) -> bool {
        if !self.segments.contains_key(wall_id) {
            return false;
        }
        let list = self.openings.entry(wall_id.to_string()).or_default();
        if !list.contains(object_id) {
            list.push(object_id.clone());
        }
        true
    }

    /// Detach an opening object from whichever wall holds it.
    pub fn unregister_opening(&mut self, object_id: &ObjectId) {
        for list in self.openings.values_mut() {
            list.retain(|id| id != object_id);
        }
        self.openings.retain(|_, list| !list.is_empty());
    }

    /// Opening objects attached to a wall.
    pub fn openings_of(&self, wall_id: &str) -> &[ObjectId] {
        self.openings
            .get(wall_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Rebuild every wall segment of one building from its cell union.
    ///
    /// `floors` lists the building's floor levels; the same boundary is
    /// emitted per floor. Segments whose geometry survived the edit keep
    /// their ids and openings. Returns the opening objects orphaned
    /// because their wall no longer exists.
    pub fn regenerate_for_building(
        &mut self,
        building_id: &str,
        floors: &[i32],
        cells: &HashSet<GridPosition>,
    ) -> Vec<ObjectId> {
        let old_ids = self.by_building.remove(building_id).unwrap_or_default();
        for id in &old_ids {
            self.segments.remove(id);
        }

        let mut ids = Vec::new();
        for &floor in floors {
            for (axis, line, start, end) in boundary_runs(cells) {
                let id = segment_id(building_id, floor, axis, line, start, end);
                self.segments.insert(
                    id.clone(),
                    WallSegment {
                        id: id.clone(),
                        building_id: building_id.to_string(),
                        floor,
                        axis,
                        line,
                        start,
                        end,
                    },
                );
                ids.push(id);
            }
        }
        self.by_building.insert(building_id.to_string(), ids);

        let mut orphaned = Vec::new();
        for id in old_ids {
            if !self.segments.contains_key(&id)
                && let Some(list) = self.openings.remove(&id)
            {
                orphaned.extend(list);
            }
        }
        orphaned
    }

    /// Drop every segment of a building. Returns the orphaned opening
    /// objects.
    pub fn remove_building(&mut self, building_id: &str) -> Vec<ObjectId> {
        let mut orphaned = Vec::new();
        if let Some(ids) = self.by_building.remove(building_id) {
            for id in ids {
                self.segments.remove(&id);
                if let Some(list) = self.openings.remove(&id) {
                    orphaned.extend(list);
                }
            }
        }
        orphaned
    }
}

/// Deterministic wall id from the segment's geometry.
fn segment_id(
    building_id: &str,
    floor: i32,
    axis: WallAxis,
    line: i32,
    start: i32,
    end: i32,
) -> WallId {
    let axis = match axis {
        WallAxis::X => 'x',
        WallAxis::Z => 'z',
    };
    format!("wall:{building_id}:f{floor}:{axis}{line}:{start}-{end}")
}

/// Boundary unit-edges of a cell union, merged into maximal runs.
///
/// Returns (axis, line, start, end) tuples with `end` exclusive. An
/// X-axis edge at (line z, cell x) exists when exactly one of the cells
/// (x, z-1) and (x, z) is inside; Z-axis symmetric.
fn boundary_runs(cells: &HashSet<GridPosition>) -> Vec<(WallAxis, i32, i32, i32)> {
    if cells.is_empty() {
        return Vec::new();
    }

    // Collect unit edges keyed by (axis, line) -> indices along the axis.
    let mut edges: HashMap<(WallAxis, i32), Vec<i32>> = HashMap::new();
    for cell in cells {
        let inside = |x: i32, z: i32| cells.contains(&GridPosition::new(x, z));
        if !inside(cell.x, cell.z - 1) {
            edges.entry((WallAxis::X, cell.z)).or_default().push(cell.x);
        }
        if !inside(cell.x, cell.z + 1) {
            edges
                .entry((WallAxis::X, cell.z + 1))
                .or_default()
                .push(cell.x);
        }
        if !inside(cell.x - 1, cell.z) {
            edges.entry((WallAxis::Z, cell.x)).or_default().push(cell.z);
        }
        if !inside(cell.x + 1, cell.z) {
            edges
                .entry((WallAxis::Z, cell.x + 1))
                .or_default()
                .push(cell.z);
        }
    }

    // Merge consecutive indices into runs.
    let mut runs = Vec::new();
    let mut keys: Vec<(WallAxis, i32)> = edges.keys().copied().collect();
    keys.sort_by_key(|(axis, line)| (matches!(axis, WallAxis::Z), *line));
    for key in keys {
        let mut indices = edges.remove(&key).unwrap();
        indices.sort_unstable();
        indices.dedup();
        let mut start = indices[0];
        let mut prev = indices[0];
        for &i in &indices[1..] {
            if i != prev + 1 {
                runs.push((key.0, key.1, start, prev + 1));
                start = i;
            }
            prev = i;
        }
        runs.push((key.0, key.1, start, prev + 1));
    }
    runs
}
