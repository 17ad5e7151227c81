//! Move/Placement Validator
//!
//! Pure predicates combining occupancy, ground-material exclusivity,
//! wall-crossing, and floor-containment rules. The checks encode the
//! domain rule: ground materials are outdoors, built content above floor
//! 0 lives inside a building, and walls are impassable unless pierced by
//! a door or window.
//!
//! Rejections are ordinary return values, never errors: a failed check
//! means the requested mutation simply is not applied.

use crate::assets::AssetMetadata;
use crate::building::{BuildingRegistry, WallSet};
use crate::grid::{GridPosition, OccupancyGrid, Orientation, rect_cells};
use crate::objects::ObjectId;

/// First check a placement failed, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementRejection {
    /// The asset id resolves to nothing in the registry (facade dry runs;
    /// [`check_placement`] itself takes resolved metadata)
    UnknownAsset,
    /// A cell in the target rectangle is held by a blocking occupant
    CellOccupied,
    /// Ground material overlapping a building footprint cell
    GroundInsideBuilding,
    /// The footprint would straddle a wall segment on the same floor
    CrossesWall,
    /// Above floor 0 and not fully inside a building with that floor
    OutsideBuilding,
}

/// One placement or move request being validated.
#[derive(Debug, Clone, Copy)]
pub struct PlacementQuery<'a> {
    /// Metadata of the asset being placed or moved
    pub asset: &'a AssetMetadata,
    /// Target anchor cell
    pub position: GridPosition,
    /// Target orientation (East/West swap the footprint axes)
    pub orientation: Orientation,
    /// Target floor
    pub floor: i32,
    /// Ids whose occupancy must not count against the request: the moving
    /// object itself plus any shaft siblings moving with it
    pub exclude: &'a [ObjectId],
}

/// Run every check in order, short-circuiting on the first failure.
pub fn check_placement(
    query: &PlacementQuery<'_>,
    grid: &OccupancyGrid,
    buildings: &BuildingRegistry,
    walls: &WallSet,
    wall_thickness_ratio: f32,
) -> Result<(), PlacementRejection> {
    let size = query.orientation.footprint_size(query.asset.size);

    // 1. Grid occupancy, excluding the mover's own cells.
    if grid.is_occupied_excluding(
        query.position,
        size,
        query.asset.can_stack,
        query.asset.category,
        query.floor,
        query.exclude,
    ) {
        return Err(PlacementRejection::CellOccupied);
    }

    // 2. Ground materials never overlap a building footprint.
    if query.asset.category.is_ground_tile() {
        for cell in rect_cells(query.position, size) {
            if buildings.building_at_cell(cell.x, cell.z).is_some() {
                return Err(PlacementRejection::GroundInsideBuilding);
            }
        }
    }

    // 3. Wall crossing: the wall centerline strictly inside the footprint
    // rejects; touching an edge is legitimate wall-adjacent placement.
    if !query.asset.category.ignores_walls() {
        let metrics = grid.metrics();
        let (min, max) = metrics.footprint_bounds(query.position, size);
        let min = glam::Vec2::new(min.x, min.z);
        let max = glam::Vec2::new(max.x, max.z);
        for segment in walls.segments_on_floor(query.floor) {
            if segment.crosses_rect(min, max, metrics.cell_size, wall_thickness_ratio) {
                return Err(PlacementRejection::CrossesWall);
            }
        }
    }

    // 4. Above floor 0, every cell must lie inside a building that has the
    // target floor. Windows are validated via wall geometry, and
    // buildings/stairwells define floors rather than requiring them.
    if query.floor != 0 && !query.asset.category.is_floor_exempt() {
        for cell in rect_cells(query.position, size) {
            let inside = buildings
                .building_at_cell(cell.x, cell.z)
                .is_some_and(|b| b.has_floor(query.floor));
            if !inside {
                return Err(PlacementRejection::OutsideBuilding);
            }
        }
    }

    Ok(())
}

/// Boolean form of [`check_placement`].
pub fn can_place_or_move(
    query: &PlacementQuery<'_>,
    grid: &OccupancyGrid,
    buildings: &BuildingRegistry,
    walls: &WallSet,
    wall_thickness_ratio: f32,
) -> bool {
    check_placement(query, grid, buildings, walls, wall_thickness_ratio).is_ok()
}
