//! Asset Metadata & Registry
//!
//! The editing core does not own asset definitions; it consumes metadata
//! (footprint size, category, stacking rules) supplied by an external
//! registry. The registry is an explicitly constructed service handed to
//! the facade, never a process-wide singleton, so the core stays testable
//! in isolation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Identifier of an asset definition in the registry.
pub type AssetId = String;

/// Domain category of an asset.
///
/// Categories drive placement rules: ground tiles are outdoor-only and
/// evictable, walls/fences stack, elevators/stairwells span every floor
/// of their building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetCategory {
    StorageUnit,
    Gate,
    Door,
    Elevator,
    Wall,
    Fence,
    Floor,
    Pavement,
    Grass,
    Gravel,
    Window,
    Building,
    Stairwell,
}

impl AssetCategory {
    /// Ground materials: replaceable outdoor surface tiles.
    pub fn is_ground_tile(&self) -> bool {
        matches!(
            self,
            AssetCategory::Pavement | AssetCategory::Grass | AssetCategory::Gravel
        )
    }

    /// Categories whose placements always span every floor of a building.
    pub fn is_vertical_shaft(&self) -> bool {
        matches!(self, AssetCategory::Elevator | AssetCategory::Stairwell)
    }

    /// Categories exempt from the "above floor 0 must be inside a building"
    /// rule. Windows are wall-attached and validated against wall geometry;
    /// buildings and stairwells define floors rather than requiring them.
    pub fn is_floor_exempt(&self) -> bool {
        matches!(
            self,
            AssetCategory::Window | AssetCategory::Building | AssetCategory::Stairwell
        )
    }

    /// Categories that skip the wall-crossing check.
    ///
    /// Ground tiles lie under walls, walls/fences are themselves boundary
    /// geometry, and windows mount onto walls via an attachment.
    pub fn ignores_walls(&self) -> bool {
        self.is_ground_tile()
            || matches!(
                self,
                AssetCategory::Wall | AssetCategory::Fence | AssetCategory::Window
            )
    }
}

/// Footprint size of an asset in grid cells (before orientation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    /// Cells along the X axis
    pub x: i32,
    /// Cells along the Z axis
    pub z: i32,
}

impl GridSize {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// A 1x1 footprint.
    pub fn unit() -> Self {
        Self { x: 1, z: 1 }
    }

    /// Footprint with the axes swapped (for 90-degree rotations).
    pub fn swapped(&self) -> Self {
        Self {
            x: self.z,
            z: self.x,
        }
    }

    pub fn cell_count(&self) -> i32 {
        self.x * self.z
    }
}

/// Metadata describing one placeable asset.
///
/// Owned by the external registry; placed objects reference it by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetMetadata {
    /// Registry id of the asset
    pub id: AssetId,
    /// Display name (e.g. "Storage Unit 10x10")
    pub name: String,
    /// Domain category
    pub category: AssetCategory,
    /// Grid footprint before orientation is applied
    pub size: GridSize,
    /// Whether this asset coexists with other stacking occupants in a cell
    #[serde(default)]
    pub can_stack: bool,
    /// Whether this asset carries a device binding (smart hardware)
    #[serde(default)]
    pub is_smart: bool,
    /// Whether placements span every floor of their building
    #[serde(default)]
    pub spans_all_floors: bool,
}

impl AssetMetadata {
    /// True when placements of this asset must exist on every floor of the
    /// containing building (explicit flag or shaft category).
    pub fn is_vertical_shaft(&self) -> bool {
        self.spans_all_floors || self.category.is_vertical_shaft()
    }
}

/// Lookup service for asset metadata.
///
/// Constructed by the host, populated from whatever catalog it has, and
/// passed into the facade by value.
#[derive(Debug, Default)]
pub struct AssetRegistry {
    assets: HashMap<AssetId, AssetMetadata>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) an asset definition.
    pub fn register(&mut self, asset: AssetMetadata) {
        self.assets.insert(asset.id.clone(), asset);
    }

    /// Look up an asset by id.
    pub fn get(&self, id: &str) -> Option<&AssetMetadata> {
        self.assets.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.assets.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetMetadata> {
        self.assets.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_asset(id: &str, category: AssetCategory) -> AssetMetadata {
        AssetMetadata {
            id: id.to_string(),
            name: id.to_string(),
            category,
            size: GridSize::unit(),
            can_stack: false,
            is_smart: false,
            spans_all_floors: false,
        }
    }

    #[test]
    fn ground_tile_categories() {
        assert!(AssetCategory::Pavement.is_ground_tile());
        assert!(AssetCategory::Grass.is_ground_tile());
        assert!(AssetCategory::Gravel.is_ground_tile());
        assert!(!AssetCategory::StorageUnit.is_ground_tile());
        assert!(!AssetCategory::Wall.is_ground_tile());
    }

    #[test]
    fn shaft_flag_or_category() {
        let elevator = unit_asset("lift", AssetCategory::Elevator);
        assert!(elevator.is_vertical_shaft());

        let mut pillar = unit_asset("pillar", AssetCategory::StorageUnit);
        assert!(!pillar.is_vertical_shaft());
        pillar.spans_all_floors = true;
        assert!(pillar.is_vertical_shaft());
    }

    #[test]
    fn registry_lookup() {
        let mut registry = AssetRegistry::new();
        assert!(registry.get("unit").is_none());

        registry.register(unit_asset("unit", AssetCategory::StorageUnit));
        assert!(registry.contains("unit"));
        assert_eq!(registry.get("unit").unwrap().category, AssetCategory::StorageUnit);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn size_swap_for_rotation() {
        let size = GridSize::new(3, 1);
        assert_eq!(size.swapped(), GridSize::new(1, 3));
        assert_eq!(size.cell_count(), 3);
    }

    #[test]
    fn category_serde_uses_snake_case() {
        let json = serde_json::to_string(&AssetCategory::StorageUnit).unwrap();
        assert_eq!(json, "\"storage_unit\"");
        let back: AssetCategory = serde_json::from_str("\"pavement\"").unwrap();
        assert_eq!(back, AssetCategory::Pavement);
    }
}
