//! Placed Objects
//!
//! The objects sitting on the grid, keyed by id (arena + index pattern:
//! objects reference buildings, walls, and assets by id, never by
//! pointer, which keeps serialization flat and avoids ownership cycles).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::assets::AssetId;
use crate::building::{BuildingId, WallId};
use crate::grid::{GridPosition, Orientation};

/// Identifier of a placed object.
pub type ObjectId = String;

/// Attachment of a wall-mounted item (door/window) to a wall segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallAttachment {
    /// Id of the wall segment
    pub wall_id: WallId,
    /// Normalized position along the wall centerline, 0..1
    pub position: f32,
}

/// Link from a placed object to an external entity (e.g. a smart device),
/// with the last state reported for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    /// Id of the bound external entity
    pub entity_id: String,
    /// Last-known state, opaque to the core
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_state: Option<serde_json::Value>,
}

/// One object placed in the facility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedObject {
    pub id: ObjectId,
    /// Reference into the external asset registry
    pub asset_id: AssetId,
    /// Anchor cell (minimum corner of the footprint)
    pub position: GridPosition,
    #[serde(default)]
    pub orientation: Orientation,
    /// Floor the object sits on
    #[serde(default)]
    pub floor: i32,
    /// Building containing the object, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_id: Option<BuildingId>,
    /// Wall mount for doors/windows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wall_attachment: Option<WallAttachment>,
    /// External entity binding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<Binding>,
    /// Shared id of a vertical shaft group (elevator/stairwell)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shaft_id: Option<String>,
    /// Applied skin, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skin_id: Option<String>,
    /// User-visible name override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Free-form host properties
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub properties: HashMap<String, serde_json::Value>,
}

impl PlacedObject {
    /// A fresh object with the optional fields empty.
    pub fn new(
        id: ObjectId,
        asset_id: AssetId,
        position: GridPosition,
        orientation: Orientation,
        floor: i32,
    ) -> Self {
        Self {
            id,
            asset_id,
            position,
            orientation,
            floor,
            building_id: None,
            wall_attachment: None,
            binding: None,
            shaft_id: None,
            skin_id: None,
            name: None,
            properties: HashMap::new(),
        }
    }
}

/// Id-keyed store of every placed object.
///
/// Exclusive owner of `PlacedObject` values while they are placed; the
/// facade is the only mutator.
#[derive(Debug, Default)]
pub struct ObjectStore {
    objects: HashMap<ObjectId, PlacedObject>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, object: PlacedObject) {
        self.objects.insert(object.id.clone(), object);
    }

    pub fn get(&self, id: &str) -> Option<&PlacedObject> {
        self.objects.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut PlacedObject> {
        self.objects.get_mut(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<PlacedObject> {
        self.objects.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.objects.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlacedObject> {
        self.objects.values()
    }

    /// Objects on one floor.
    pub fn on_floor(&self, floor: i32) -> Vec<&PlacedObject> {
        self.objects.values().filter(|o| o.floor == floor).collect()
    }

    /// Objects belonging to one building.
    pub fn in_building(&self, building_id: &str) -> Vec<&PlacedObject> {
        self.objects
            .values()
            .filter(|o| o.building_id.as_deref() == Some(building_id))
            .collect()
    }

    /// Objects on one floor of one building.
    pub fn on_building_floor(&self, building_id: &str, floor: i32) -> Vec<&PlacedObject> {
        self.objects
            .values()
            .filter(|o| o.floor == floor && o.building_id.as_deref() == Some(building_id))
            .collect()
    }

    /// Members of a vertical shaft group, sorted by floor.
    pub fn shaft_members(&self, shaft_id: &str) -> Vec<&PlacedObject> {
        let mut members: Vec<&PlacedObject> = self
            .objects
            .values()
            .filter(|o| o.shaft_id.as_deref() == Some(shaft_id))
            .collect();
        members.sort_by_key(|o| o.floor);
        members
    }
}
