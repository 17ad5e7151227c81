//! Building Registry
//!
//! Buildings, their floors, and the structural operations on them:
//! create, merge-on-overlap, translate, floor add/remove/shift, and
//! partial demolition. Operations never partially apply; every invariant
//! is checked before the first mutation.
//!
//! Buildings are looked up by id (arena + index pattern); placed objects
//! hold building ids, never references.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::building::footprint::{Footprint, cover_cells};
use crate::grid::GridPosition;

/// Identifier of a building.
pub type BuildingId = String;

/// One floor of a building.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Floor {
    /// Level index; contiguous from 0 within a building
    pub level: i32,
    /// Floor height (meters)
    pub height: f32,
}

/// A building: one or more footprint rectangles plus an ordered floor
/// list. Floor levels are contiguous integers starting at 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: BuildingId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub footprints: Vec<Footprint>,
    pub floors: Vec<Floor>,
    /// Creation sequence; the lowest-seq participant keeps its identity on
    /// merge. Not persisted.
    #[serde(skip)]
    pub seq: u64,
}

impl Building {
    /// Does any footprint contain the cell?
    pub fn contains_cell(&self, x: i32, z: i32) -> bool {
        self.footprints.iter().any(|f| f.contains(x, z))
    }

    /// Union of all footprint cells.
    pub fn cells(&self) -> HashSet<GridPosition> {
        self.footprints.iter().flat_map(|f| f.cells()).collect()
    }

    pub fn floor(&self, level: i32) -> Option<&Floor> {
        self.floors.iter().find(|f| f.level == level)
    }

    pub fn has_floor(&self, level: i32) -> bool {
        self.floor(level).is_some()
    }

    /// Floor levels, sorted ascending.
    pub fn floor_levels(&self) -> Vec<i32> {
        let mut levels: Vec<i32> = self.floors.iter().map(|f| f.level).collect();
        levels.sort_unstable();
        levels
    }

    /// Highest floor level.
    pub fn top_level(&self) -> i32 {
        self.floors.iter().map(|f| f.level).max().unwrap_or(0)
    }

    /// Does any footprint intersect the given rectangle?
    pub fn overlaps(&self, footprint: &Footprint) -> bool {
        self.footprints.iter().any(|f| f.intersects(footprint))
    }
}

/// Why a building operation was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildingOpError {
    UnknownBuilding,
    /// A floor already exists at the requested level
    DuplicateFloor,
    /// No floor at the requested level
    MissingFloor,
    /// Removing the only floor would leave a floorless building
    LastFloor,
    /// A shift would collide levels or push one below 0
    LevelConflict,
    /// A translation would overlap another building
    Overlap,
    /// Merge needs at least two distinct buildings
    NothingToMerge,
}

/// All buildings in the facility.
#[derive(Debug, Default)]
pub struct BuildingRegistry {
    buildings: HashMap<BuildingId, Building>,
    next_seq: u64,
}

impl BuildingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Creation & removal
    // ------------------------------------------------------------------

    /// Allocate a new building with floor 0 registered automatically.
    pub fn create_building(
        &mut self,
        footprint: Footprint,
        name: Option<String>,
        floor_height: f32,
    ) -> &Building {
        let seq = self.next_seq;
        self.next_seq += 1;
        let id = format!("bld-{seq}");
        let building = Building {
            id: id.clone(),
            name,
            footprints: vec![footprint],
            floors: vec![Floor {
                level: 0,
                height: floor_height,
            }],
            seq,
        };
        self.buildings.insert(id.clone(), building);
        &self.buildings[&id]
    }

    /// Re-insert a building snapshot (undo/redo and document import).
    /// A zero `seq` is assigned the next sequence number.
    pub fn insert(&mut self, mut building: Building) {
        if building.seq == 0 && self.buildings.values().any(|b| b.seq == 0) {
            building.seq = self.next_seq;
        }
        self.next_seq = self.next_seq.max(building.seq + 1);
        self.buildings.insert(building.id.clone(), building);
    }

    pub fn remove(&mut self, id: &str) -> Option<Building> {
        self.buildings.remove(id)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn get(&self, id: &str) -> Option<&Building> {
        self.buildings.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Building> {
        self.buildings.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.buildings.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Building> {
        self.buildings.values()
    }

    /// Buildings whose footprints intersect the rectangle (merge-vs-create
    /// decision).
    pub fn find_overlapping(&self, footprint: &Footprint) -> Vec<BuildingId> {
        let mut ids: Vec<BuildingId> = self
            .buildings
            .values()
            .filter(|b| b.overlaps(footprint))
            .map(|b| b.id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Building containing a cell, if any. Footprints never overlap
    /// between buildings, so at most one matches.
    pub fn building_at_cell(&self, x: i32, z: i32) -> Option<&Building> {
        self.buildings.values().find(|b| b.contains_cell(x, z))
    }

    /// Union of footprint cells for a building.
    pub fn building_cells(&self, id: &str) -> HashSet<GridPosition> {
        self.buildings
            .get(id)
            .map(|b| b.cells())
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Merge
    // ------------------------------------------------------------------

    /// Union the footprints and floors of the given buildings into one.
    ///
    /// Duplicate floor levels collapse to one (the first participant's
    /// height wins). The lowest-seq participant keeps its id for stable
    /// identity; the others are removed. Returns the surviving id.
    pub fn merge(&mut self, ids: &[BuildingId]) -> Result<BuildingId, BuildingOpError> {
        let mut unique: Vec<&BuildingId> = ids.iter().collect();
        unique.sort();
        unique.dedup();
        if unique.len() < 2 {
            return Err(BuildingOpError::NothingToMerge);
        }
        if unique.iter().any(|id| !self.buildings.contains_key(*id)) {
            return Err(BuildingOpError::UnknownBuilding);
        }

        let survivor_id = unique
            .iter()
            .min_by_key(|id| self.buildings[id.as_str()].seq)
            .map(|id| (*id).clone())
            .expect("non-empty participant list");

        let mut footprints = Vec::new();
        let mut floors: Vec<Floor> = Vec::new();
        for id in &unique {
            let building = &self.buildings[*id];
            footprints.extend(building.footprints.iter().copied());
            for floor in &building.floors {
                if !floors.iter().any(|f| f.level == floor.level) {
                    floors.push(*floor);
                }
            }
        }
        floors.sort_by_key(|f| f.level);
        footprints.dedup();

        let removed: Vec<BuildingId> = unique
            .iter()
            .filter(|id| ***id != survivor_id)
            .map(|id| (*id).clone())
            .collect();
        for id in removed {
            self.buildings.remove(&id);
        }

        let survivor = self
            .buildings
            .get_mut(&survivor_id)
            .expect("survivor exists");
        survivor.footprints = footprints;
        survivor.floors = floors;

        Ok(survivor_id)
    }

    // ------------------------------------------------------------------
    // Floors
    // ------------------------------------------------------------------

    /// Append a floor on top of the building. Returns the new floor.
    pub fn add_floor(&mut self, id: &str, height: f32) -> Result<Floor, BuildingOpError> {
        let building = self
            .buildings
            .get_mut(id)
            .ok_or(BuildingOpError::UnknownBuilding)?;
        let floor = Floor {
            level: building.top_level() + 1,
            height,
        };
        building.floors.push(floor);
        Ok(floor)
    }

    /// Register a floor at an explicit level (after a shift opened the
    /// slot). Rejects duplicates.
    pub fn add_floor_at(
        &mut self,
        id: &str,
        level: i32,
        height: f32,
    ) -> Result<Floor, BuildingOpError> {
        let building = self
            .buildings
            .get_mut(id)
            .ok_or(BuildingOpError::UnknownBuilding)?;
        if level < 0 || building.has_floor(level) {
            return Err(BuildingOpError::DuplicateFloor);
        }
        let floor = Floor { level, height };
        building.floors.push(floor);
        building.floors.sort_by_key(|f| f.level);
        Ok(floor)
    }

    /// Remove the floor at `level`. The caller must already have relocated
    /// or deleted every object on that floor.
    pub fn remove_floor(&mut self, id: &str, level: i32) -> Result<Floor, BuildingOpError> {
        let building = self
            .buildings
            .get_mut(id)
            .ok_or(BuildingOpError::UnknownBuilding)?;
        let index = building
            .floors
            .iter()
            .position(|f| f.level == level)
            .ok_or(BuildingOpError::MissingFloor)?;
        if building.floors.len() <= 1 {
            return Err(BuildingOpError::LastFloor);
        }
        Ok(building.floors.remove(index))
    }

    /// Renumber floors at or above `from_level` by `delta` (+1 or -1).
    ///
    /// Rejected before any mutation if a shifted level would collide with
    /// an unshifted one or drop below 0. The facade pairs this with the
    /// same shift on placed-object floors and occupancy records.
    pub fn shift_floor_levels(
        &mut self,
        id: &str,
        from_level: i32,
        delta: i32,
    ) -> Result<(), BuildingOpError> {
        if delta != 1 && delta != -1 {
            return Err(BuildingOpError::LevelConflict);
        }
        let building = self
            .buildings
            .get_mut(id)
            .ok_or(BuildingOpError::UnknownBuilding)?;

        let shifted: Vec<i32> = building
            .floors
            .iter()
            .map(|f| {
                if f.level >= from_level {
                    f.level + delta
                } else {
                    f.level
                }
            })
            .collect();
        let mut sorted = shifted.clone();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.len() != shifted.len() || sorted.first().is_some_and(|&l| l < 0) {
            return Err(BuildingOpError::LevelConflict);
        }

        for floor in &mut building.floors {
            if floor.level >= from_level {
                floor.level += delta;
            }
        }
        building.floors.sort_by_key(|f| f.level);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Footprint mutation
    // ------------------------------------------------------------------

    /// Shift every footprint by a cell delta. Contained objects are the
    /// facade's responsibility. Rejects overlap with any other building.
    pub fn translate(&mut self, id: &str, dx: i32, dz: i32) -> Result<(), BuildingOpError> {
        let building = self
            .buildings
            .get(id)
            .ok_or(BuildingOpError::UnknownBuilding)?;
        let moved: Vec<Footprint> = building
            .footprints
            .iter()
            .map(|f| f.translated(dx, dz))
            .collect();

        for other in self.buildings.values() {
            if other.id == id {
                continue;
            }
            if moved.iter().any(|m| other.overlaps(m)) {
                return Err(BuildingOpError::Overlap);
            }
        }

        self.buildings
            .get_mut(id)
            .expect("checked above")
            .footprints = moved;
        Ok(())
    }

    /// Partial demolition: remove cells from a building and re-cover the
    /// remainder with rectangles. Returns true when the building is left
    /// empty; the caller must then issue a full building delete.
    pub fn remove_cells(
        &mut self,
        id: &str,
        cells: &[GridPosition],
    ) -> Result<bool, BuildingOpError> {
        let building = self
            .buildings
            .get_mut(id)
            .ok_or(BuildingOpError::UnknownBuilding)?;

        let mut remaining = building.cells();
        for cell in cells {
            remaining.remove(cell);
        }
        building.footprints = cover_cells(&remaining);
        Ok(building.footprints.is_empty())
    }
}
