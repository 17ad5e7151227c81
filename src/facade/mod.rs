//! Editing Facade
//!
//! Single entry point for every edit: validates placement requests,
//! mutates grid/building/object state, records invertible history
//! actions, and emits change notifications. Undo/redo replay goes through
//! the same mutation primitives as live edits, so occupancy and building
//! invariants are never bypassed.
//!
//! The facade is the sole mutator of core state; rendering and
//! persistence layers read snapshots and listen for events.

pub mod interactive;

use std::collections::HashSet;

use crate::assets::{AssetCategory, AssetMetadata, AssetRegistry, GridSize};
use crate::building::{
    Building, BuildingId, BuildingRegistry, Footprint, WallSet,
};
use crate::config::EditorConfig;
use crate::events::{EditorEvent, EventBus, SubscriberId};
use crate::grid::{GridPosition, OccupancyGrid, Orientation, rect_cells};
use crate::history::{ActionHistory, HistoryAction};
use crate::objects::{ObjectId, ObjectStore, PlacedObject, WallAttachment};
use crate::validator::{PlacementQuery, PlacementRejection, check_placement};

pub use interactive::{GestureState, InteractiveMove};

/// Orchestrates the grid, building model, validator, and action history.
pub struct EditingFacade {
    config: EditorConfig,
    assets: AssetRegistry,
    grid: OccupancyGrid,
    buildings: BuildingRegistry,
    walls: WallSet,
    objects: ObjectStore,
    history: ActionHistory,
    events: EventBus,
    selection: Vec<ObjectId>,
    pending_move: Option<InteractiveMove>,
    /// Opaque camera state carried for the persistence layer.
    camera: Option<serde_json::Value>,
    next_object_seq: u64,
    next_shaft_seq: u64,
}

impl EditingFacade {
    pub fn new(config: EditorConfig, assets: AssetRegistry) -> Self {
        Self {
            grid: OccupancyGrid::new(config.cell_size),
            config,
            assets,
            buildings: BuildingRegistry::new(),
            walls: WallSet::new(),
            objects: ObjectStore::new(),
            history: ActionHistory::new(config.max_history_depth),
            events: EventBus::new(),
            selection: Vec::new(),
            pending_move: None,
            camera: None,
            next_object_seq: 0,
            next_shaft_seq: 0,
        }
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn assets(&self) -> &AssetRegistry {
        &self.assets
    }

    pub fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    pub fn buildings(&self) -> &BuildingRegistry {
        &self.buildings
    }

    pub fn walls(&self) -> &WallSet {
        &self.walls
    }

    pub fn objects(&self) -> &ObjectStore {
        &self.objects
    }

    pub fn history(&self) -> &ActionHistory {
        &self.history
    }

    pub fn selection(&self) -> &[ObjectId] {
        &self.selection
    }

    pub fn pending_move(&self) -> Option<&InteractiveMove> {
        self.pending_move.as_ref()
    }

    pub fn camera(&self) -> Option<&serde_json::Value> {
        self.camera.as_ref()
    }

    pub fn set_camera(&mut self, camera: Option<serde_json::Value>) {
        self.camera = camera;
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriberId
    where
        F: FnMut(&EditorEvent) + 'static,
    {
        self.events.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        self.events.unsubscribe(id)
    }

    // ------------------------------------------------------------------
    // Object placement
    // ------------------------------------------------------------------

    /// Dry-run a placement, reporting the first rule it would break.
    /// Pure; no mutation.
    pub fn check(
        &self,
        asset_id: &str,
        position: GridPosition,
        orientation: Orientation,
        floor: i32,
    ) -> Result<(), PlacementRejection> {
        let Some(asset) = self.assets.get(asset_id) else {
            return Err(PlacementRejection::UnknownAsset);
        };
        self.validate(asset, position, orientation, floor, &[])
    }

    /// Place an asset. Returns the new object's id, or `None` when the
    /// validator rejects the request or the asset id is unknown.
    ///
    /// Vertical-shaft assets (elevators/stairwells) placed inside a
    /// building propagate to every floor as one linked group committed as
    /// a single batch. Ground tiles evicted by the placement are deleted
    /// inside the same batch so undo restores them.
    pub fn place_object(
        &mut self,
        asset_id: &str,
        position: GridPosition,
        orientation: Orientation,
        floor: i32,
    ) -> Option<ObjectId> {
        let Some(asset) = self.assets.get(asset_id).cloned() else {
            log::warn!("place request for unknown asset {asset_id}");
            return None;
        };
        if asset.category == AssetCategory::Building {
            log::warn!("building assets are placed via create_building");
            return None;
        }

        let building_at_anchor = self
            .buildings
            .building_at_cell(position.x, position.z)
            .map(|b| b.id.clone());

        if asset.is_vertical_shaft()
            && let Some(building_id) = &building_at_anchor
        {
            return self.place_shaft(&asset, position, orientation, building_id.clone());
        }

        if self
            .validate(&asset, position, orientation, floor, &[])
            .is_err()
        {
            return None;
        }

        let id = self.next_object_id();
        let mut object = PlacedObject::new(
            id.clone(),
            asset.id.clone(),
            position,
            orientation,
            floor,
        );
        object.building_id = building_at_anchor;

        let size = orientation.footprint_size(asset.size);
        let mut actions =
            self.ground_eviction_actions(position, size, floor, asset.can_stack, asset.category);
        actions.push(HistoryAction::Place { object });

        for action in &actions {
            self.apply_action(action);
        }
        self.commit(actions);
        Some(id)
    }

    /// Place several objects as one atomic batch (paste). Requests that
    /// fail validation are skipped with a warning; the ids of the placed
    /// objects are returned in request order.
    pub fn paste_objects(
        &mut self,
        requests: &[(String, GridPosition, Orientation, i32)],
    ) -> Vec<ObjectId> {
        let mut actions = Vec::new();
        let mut ids = Vec::new();

        for (asset_id, position, orientation, floor) in requests {
            let Some(asset) = self.assets.get(asset_id).cloned() else {
                log::warn!("paste skipped unknown asset {asset_id}");
                continue;
            };
            if self
                .validate(&asset, *position, *orientation, *floor, &[])
                .is_err()
            {
                log::warn!("paste skipped rejected placement of {asset_id}");
                continue;
            }

            let id = self.next_object_id();
            let mut object =
                PlacedObject::new(id.clone(), asset.id.clone(), *position, *orientation, *floor);
            object.building_id = self
                .buildings
                .building_at_cell(position.x, position.z)
                .map(|b| b.id.clone());

            let size = orientation.footprint_size(asset.size);
            let mut batch = self.ground_eviction_actions(
                *position,
                size,
                *floor,
                asset.can_stack,
                asset.category,
            );
            batch.push(HistoryAction::Place { object });
            for action in &batch {
                self.apply_action(action);
            }
            actions.extend(batch);
            ids.push(id);
        }

        if !actions.is_empty() {
            self.commit(actions);
        }
        ids
    }

    /// Delete an object. Shaft members delete together as one batch.
    pub fn delete_object(&mut self, id: &str) -> bool {
        let Some(object) = self.objects.get(id) else {
            return false;
        };

        let member_ids: Vec<ObjectId> = match &object.shaft_id {
            Some(shaft_id) => self
                .objects
                .shaft_members(shaft_id)
                .iter()
                .map(|o| o.id.clone())
                .collect(),
            None => vec![object.id.clone()],
        };

        let actions: Vec<HistoryAction> = member_ids
            .iter()
            .filter_map(|mid| self.objects.get(mid).cloned())
            .map(|object| HistoryAction::Delete { object })
            .collect();

        for action in &actions {
            self.apply_action(action);
        }
        self.commit(actions);
        true
    }

    /// Move and/or rotate an object on its floor. Shaft members move
    /// together; the whole group must validate or nothing moves.
    pub fn move_object(
        &mut self,
        id: &str,
        to_position: GridPosition,
        to_orientation: Orientation,
    ) -> bool {
        let Some(object) = self.objects.get(id).cloned() else {
            return false;
        };
        if object.position == to_position && object.orientation == to_orientation {
            return true;
        }
        let dx = to_position.x - object.position.x;
        let dz = to_position.z - object.position.z;

        let member_ids: Vec<ObjectId> = match &object.shaft_id {
            Some(shaft_id) => self
                .objects
                .shaft_members(shaft_id)
                .iter()
                .map(|o| o.id.clone())
                .collect(),
            None => vec![object.id.clone()],
        };

        let mut actions = Vec::new();
        for mid in &member_ids {
            let member = self.objects.get(mid).expect("member exists").clone();
            let Some(asset) = self.assets.get(&member.asset_id).cloned() else {
                log::warn!("move aborted: unknown asset {}", member.asset_id);
                return false;
            };
            let target = member.position.offset(dx, dz);
            if self
                .validate(&asset, target, to_orientation, member.floor, &member_ids)
                .is_err()
            {
                return false;
            }
            actions.push(HistoryAction::Move {
                object_id: member.id.clone(),
                from_position: member.position,
                to_position: target,
                from_orientation: member.orientation,
                to_orientation,
                from_floor: member.floor,
                to_floor: member.floor,
            });
        }

        for action in &actions {
            self.apply_action(action);
        }
        self.commit(actions);
        true
    }

    // ------------------------------------------------------------------
    // Undo / redo
    // ------------------------------------------------------------------

    /// Revert the most recent committed edit. No-op on empty history.
    pub fn undo(&mut self) -> bool {
        let Some(action) = self.history.undo() else {
            return false;
        };
        let inverse = action.inverse();
        self.apply_action(&inverse);
        self.notify_changed();
        true
    }

    /// Re-apply the most recently undone edit.
    pub fn redo(&mut self) -> bool {
        let Some(action) = self.history.redo() else {
            return false;
        };
        self.apply_action(&action);
        self.notify_changed();
        true
    }

    // ------------------------------------------------------------------
    // Buildings
    // ------------------------------------------------------------------

    /// Create a building with the given footprint; floor 0 registers
    /// automatically. Overlapping buildings merge into one (the oldest
    /// keeps its identity), recorded as a single undoable batch. Ground
    /// tiles under the footprint are evicted.
    ///
    /// Returns the id of the resulting building.
    pub fn create_building(
        &mut self,
        footprint: Footprint,
        name: Option<String>,
    ) -> BuildingId {
        let overlapping = self.buildings.find_overlapping(&footprint);

        // Pre-merge snapshots for the history payload.
        let pre: Vec<(Building, Vec<PlacedObject>)> = overlapping
            .iter()
            .map(|id| {
                let building = self.buildings.get(id).expect("overlap hit exists").clone();
                let objects = self
                    .objects
                    .in_building(id)
                    .into_iter()
                    .cloned()
                    .collect();
                (building, objects)
            })
            .collect();

        let mut actions = self.ground_eviction_actions(
            GridPosition::new(footprint.min_x, footprint.min_z),
            GridSize::new(footprint.width(), footprint.depth()),
            0,
            false,
            AssetCategory::Building,
        );
        for action in &actions {
            self.apply_action(action);
        }

        let new_id = self
            .buildings
            .create_building(footprint, name, self.config.default_floor_height)
            .id
            .clone();

        let result_id = if overlapping.is_empty() {
            new_id.clone()
        } else {
            let mut participants = overlapping.clone();
            participants.push(new_id.clone());
            let survivor = self
                .buildings
                .merge(&participants)
                .expect("participants exist");
            // Re-point objects of merged-away buildings.
            for (building, objects) in &pre {
                if building.id != survivor {
                    for object in objects {
                        if let Some(o) = self.objects.get_mut(&object.id) {
                            o.building_id = Some(survivor.clone());
                        }
                    }
                    self.clear_walls(&building.id);
                }
            }
            survivor
        };
        self.regenerate_walls(&result_id);

        let post = self
            .buildings
            .get(&result_id)
            .expect("result exists")
            .clone();
        let post_objects: Vec<PlacedObject> = self
            .objects
            .in_building(&result_id)
            .into_iter()
            .cloned()
            .collect();

        for (building, objects) in pre {
            actions.push(HistoryAction::BuildingDelete { building, objects });
        }
        actions.push(HistoryAction::BuildingCreate {
            building: post,
            objects: post_objects,
        });
        self.commit(actions);
        result_id
    }

    /// Delete a building together with every object it contains.
    pub fn delete_building(&mut self, id: &str) -> bool {
        let Some(building) = self.buildings.get(id).cloned() else {
            return false;
        };
        let objects: Vec<PlacedObject> =
            self.objects.in_building(id).into_iter().cloned().collect();

        let action = HistoryAction::BuildingDelete { building, objects };
        self.apply_action(&action);
        self.commit(vec![action]);
        true
    }

    /// Translate a building and everything in it by a cell delta.
    /// Rejected (returning false, mutating nothing) when the target
    /// overlaps another building or a contained object would collide.
    pub fn translate_building(&mut self, id: &str, dx: i32, dz: i32) -> bool {
        if !self.buildings.contains(id) {
            return false;
        }
        if dx == 0 && dz == 0 {
            return true;
        }
        if !self.can_translate_building(id, dx, dz) {
            return false;
        }

        let footprints = self.buildings.get(id).expect("checked").footprints.clone();
        let mut actions = Vec::new();
        // Ground tiles under the destination footprint are evicted.
        for footprint in &footprints {
            let moved = footprint.translated(dx, dz);
            let evictions = self.ground_eviction_actions(
                GridPosition::new(moved.min_x, moved.min_z),
                GridSize::new(moved.width(), moved.depth()),
                0,
                false,
                AssetCategory::Building,
            );
            for action in &evictions {
                self.apply_action(action);
            }
            actions.extend(evictions);
        }

        let action = HistoryAction::BuildingMove {
            building_id: id.to_string(),
            dx,
            dz,
        };
        self.apply_action(&action);
        actions.push(action);
        self.commit(actions);
        true
    }

    /// Partial demolition: remove cells from a building. Objects standing
    /// on the removed cells are deleted with it; when the removal empties
    /// the building it is deleted outright. One undoable batch.
    pub fn demolish_cells(&mut self, id: &str, cells: &[GridPosition]) -> bool {
        let Some(pre) = self.buildings.get(id).cloned() else {
            return false;
        };
        let removed: HashSet<GridPosition> = cells.iter().copied().collect();

        // Objects in the building whose footprint touches a removed cell.
        let doomed: Vec<PlacedObject> = self
            .objects
            .in_building(id)
            .into_iter()
            .filter(|o| {
                self.grid
                    .cells_of(&o.id)
                    .iter()
                    .any(|(_, cell)| removed.contains(cell))
            })
            .cloned()
            .collect();

        let emptied = match self.buildings.remove_cells(id, cells) {
            Ok(emptied) => emptied,
            Err(_) => return false,
        };

        let mut actions = Vec::new();
        if emptied {
            // Everything in the building goes with it.
            let objects: Vec<PlacedObject> =
                self.objects.in_building(id).into_iter().cloned().collect();
            for object in &objects {
                self.remove_object(&object.id);
            }
            self.clear_walls(id);
            self.buildings.remove(id);
            actions.push(HistoryAction::BuildingDelete {
                building: pre,
                objects,
            });
        } else {
            for object in &doomed {
                self.remove_object(&object.id);
                actions.push(HistoryAction::Delete {
                    object: object.clone(),
                });
            }
            self.regenerate_walls(id);
            let post = self.buildings.get(id).expect("still exists").clone();
            actions.push(HistoryAction::BuildingDelete {
                building: pre,
                objects: Vec::new(),
            });
            actions.push(HistoryAction::BuildingCreate {
                building: post,
                objects: Vec::new(),
            });
        }
        self.commit(actions);
        true
    }

    // ------------------------------------------------------------------
    // Floors
    // ------------------------------------------------------------------

    /// Append a floor on top of a building. Existing vertical shafts
    /// extend onto the new floor inside the same batch. Returns the new
    /// level.
    pub fn add_floor(&mut self, building_id: &str) -> Option<i32> {
        let building = self.buildings.get(building_id)?;
        let level = building.top_level() + 1;
        let height = self.config.default_floor_height;

        let mut actions = vec![HistoryAction::FloorAdd {
            building_id: building_id.to_string(),
            level,
            height,
        }];
        actions.extend(self.shaft_extension_actions(building_id, level));

        for action in &actions {
            self.apply_action(action);
        }
        self.commit(actions);
        Some(level)
    }

    /// Insert a floor at `level`, shifting the floors at and above it up
    /// by one (placed objects and occupancy shift with them). Shafts
    /// extend onto the inserted floor.
    pub fn insert_floor(&mut self, building_id: &str, level: i32) -> bool {
        let Some(building) = self.buildings.get(building_id) else {
            return false;
        };
        if level < 0 || level > building.top_level() + 1 {
            return false;
        }
        let height = self.config.default_floor_height;

        let mut actions = vec![HistoryAction::FloorInsert {
            building_id: building_id.to_string(),
            level,
            height,
            objects: Vec::new(),
        }];
        actions.extend(self.shaft_extension_actions(building_id, level));

        for action in &actions {
            self.apply_action(action);
        }
        self.commit(actions);
        true
    }

    /// Delete the floor at `level`. Objects on it (shaft members
    /// included) are deleted within the same entry so undo restores them;
    /// floors above shift down by one.
    pub fn delete_floor(&mut self, building_id: &str, level: i32) -> bool {
        let Some(building) = self.buildings.get(building_id) else {
            return false;
        };
        if building.floors.len() <= 1 {
            return false;
        }
        let Some(floor) = building.floor(level).copied() else {
            return false;
        };

        let objects: Vec<PlacedObject> = self
            .objects
            .on_building_floor(building_id, level)
            .into_iter()
            .cloned()
            .collect();

        let action = HistoryAction::FloorDelete {
            building_id: building_id.to_string(),
            level,
            height: floor.height,
            objects,
        };
        self.apply_action(&action);
        self.commit(vec![action]);
        true
    }

    // ------------------------------------------------------------------
    // Wall openings
    // ------------------------------------------------------------------

    /// Mount a door/window object onto a wall segment at a normalized
    /// position along its centerline.
    pub fn attach_to_wall(&mut self, object_id: &str, wall_id: &str, position: f32) -> bool {
        if !self.objects.contains(object_id) {
            return false;
        }
        if !self.walls.register_opening(wall_id, &object_id.to_string()) {
            return false;
        }
        let object = self.objects.get_mut(object_id).expect("checked above");
        object.wall_attachment = Some(WallAttachment {
            wall_id: wall_id.to_string(),
            position: position.clamp(0.0, 1.0),
        });
        self.events.emit(&EditorEvent::StateUpdated);
        true
    }

    // ------------------------------------------------------------------
    // Non-history object edits
    // ------------------------------------------------------------------

    /// Rename an object. Not recorded in history.
    pub fn rename_object(&mut self, id: &str, name: Option<String>) -> bool {
        let Some(object) = self.objects.get_mut(id) else {
            return false;
        };
        object.name = name;
        self.events.emit(&EditorEvent::StateUpdated);
        true
    }

    /// Change an object's skin. Not recorded in history.
    pub fn set_object_skin(&mut self, id: &str, skin_id: Option<String>) -> bool {
        let Some(object) = self.objects.get_mut(id) else {
            return false;
        };
        object.skin_id = skin_id;
        self.events.emit(&EditorEvent::StateUpdated);
        true
    }

    /// Set a free-form property on an object. Not recorded in history.
    pub fn set_object_property(
        &mut self,
        id: &str,
        key: &str,
        value: serde_json::Value,
    ) -> bool {
        let Some(object) = self.objects.get_mut(id) else {
            return false;
        };
        object.properties.insert(key.to_string(), value);
        self.events.emit(&EditorEvent::StateUpdated);
        true
    }

    /// Record the last-known state of an object's external binding.
    pub fn set_binding_state(&mut self, id: &str, state: serde_json::Value) -> bool {
        let Some(object) = self.objects.get_mut(id) else {
            return false;
        };
        let Some(binding) = object.binding.as_mut() else {
            return false;
        };
        binding.last_state = Some(state);
        self.events.emit(&EditorEvent::StateUpdated);
        true
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Replace the selection set. Unknown ids are dropped.
    pub fn set_selection(&mut self, ids: Vec<ObjectId>) {
        let mut selected: Vec<ObjectId> =
            ids.into_iter().filter(|id| self.objects.contains(id)).collect();
        selected.dedup();
        if selected == self.selection {
            return;
        }
        self.selection = selected.clone();
        self.events
            .emit(&EditorEvent::SelectionChanged { selected });
    }

    pub fn clear_selection(&mut self) {
        self.set_selection(Vec::new());
    }

    // ------------------------------------------------------------------
    // Interactive move (two-phase, host-debounced)
    // ------------------------------------------------------------------

    /// Start dragging an object. Fails when another gesture is in flight
    /// or the object does not exist. Shaft members are linked into the
    /// gesture automatically.
    pub fn begin_interactive_move(&mut self, id: &str) -> bool {
        if self.pending_move.is_some() {
            log::warn!("interactive move already in flight");
            return false;
        }
        let Some(object) = self.objects.get(id) else {
            return false;
        };
        let linked: Vec<ObjectId> = match &object.shaft_id {
            Some(shaft_id) => self
                .objects
                .shaft_members(shaft_id)
                .iter()
                .map(|o| o.id.clone())
                .filter(|mid| mid != id)
                .collect(),
            None => Vec::new(),
        };
        self.pending_move = Some(InteractiveMove::new(
            object.id.clone(),
            linked,
            object.position,
            object.orientation,
            object.floor,
        ));
        true
    }

    /// Stream a cell delta into the pending gesture. State is not
    /// mutated until commit; hosts render the pending pose from
    /// [`Self::pending_move`].
    pub fn update_interactive_move(&mut self, dx: i32, dz: i32) -> bool {
        match self.pending_move.as_mut() {
            Some(gesture) => {
                gesture.apply_delta(dx, dz);
                true
            }
            None => false,
        }
    }

    /// Rotate the pending pose 90 degrees clockwise.
    pub fn rotate_interactive_move(&mut self) -> bool {
        match self.pending_move.as_mut() {
            Some(gesture) => {
                gesture.rotate_cw();
                true
            }
            None => false,
        }
    }

    /// Finish the gesture: validate the final pose once and commit it as
    /// a single move entry. On rejection every delta is discarded, no
    /// history is written, and false is returned. A gesture with no net
    /// change commits as a no-op.
    pub fn commit_interactive_move(&mut self) -> bool {
        let Some(gesture) = self.pending_move.take() else {
            return false;
        };
        if !gesture.has_moved() {
            return true;
        }
        let (dx, dz) = gesture.delta();
        let moved = self.move_object(&gesture.object_id, gesture.position, gesture.orientation);
        if !moved {
            log::debug!(
                "interactive move of {} rejected at delta ({dx}, {dz})",
                gesture.object_id
            );
        }
        moved
    }

    /// Abort the gesture, discarding all deltas. No history entry.
    pub fn cancel_interactive_move(&mut self) {
        self.pending_move = None;
    }

    // ------------------------------------------------------------------
    // Import support (used by the document module)
    // ------------------------------------------------------------------

    /// Drop all state, including history. Import starts from a clean
    /// facility.
    pub(crate) fn reset(&mut self) {
        self.grid = OccupancyGrid::new(self.config.cell_size);
        self.buildings = BuildingRegistry::new();
        self.walls = WallSet::new();
        self.objects = ObjectStore::new();
        self.history.clear();
        self.selection.clear();
        self.pending_move = None;
        self.next_object_seq = 0;
        self.next_shaft_seq = 0;
    }

    /// Restore a building snapshot and its walls without history.
    pub(crate) fn restore_building(&mut self, building: Building) {
        let id = building.id.clone();
        self.buildings.insert(building);
        self.regenerate_walls(&id);
    }

    /// Restore an object without validation or history. The embedded or
    /// resolved asset metadata supplies the occupancy shape. A wall
    /// attachment whose wall no longer exists is dropped with a warning.
    pub(crate) fn restore_object(&mut self, mut object: PlacedObject, asset: &AssetMetadata) {
        if let Some(attachment) = &object.wall_attachment
            && !self.walls.contains(&attachment.wall_id)
        {
            log::warn!(
                "object {} referenced missing wall {}; attachment dropped",
                object.id,
                attachment.wall_id
            );
            object.wall_attachment = None;
        }
        self.bump_sequences(&object);

        let size = object.orientation.footprint_size(asset.size);
        self.grid.mark_occupied(
            &object.id,
            object.position,
            size,
            asset.can_stack,
            asset.category,
            object.floor,
        );
        if let Some(attachment) = &object.wall_attachment {
            self.walls.register_opening(&attachment.wall_id, &object.id);
        }
        self.objects.insert(object);
    }

    /// Merge an asset definition into the registry. Legacy documents
    /// embed metadata per object record instead of referencing a catalog.
    pub(crate) fn register_asset(&mut self, asset: AssetMetadata) {
        if !self.assets.contains(&asset.id) {
            self.assets.register(asset);
        }
    }

    /// One StateUpdated + HistoryChanged after a finished import.
    pub(crate) fn notify_imported(&mut self) {
        self.notify_changed();
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn next_object_id(&mut self) -> ObjectId {
        let id = format!("obj-{}", self.next_object_seq);
        self.next_object_seq += 1;
        id
    }

    fn next_shaft_id(&mut self) -> String {
        let id = format!("shaft-{}", self.next_shaft_seq);
        self.next_shaft_seq += 1;
        id
    }

    /// Keep generated ids ahead of imported ones.
    fn bump_sequences(&mut self, object: &PlacedObject) {
        if let Some(n) = object.id.strip_prefix("obj-").and_then(|s| s.parse::<u64>().ok()) {
            self.next_object_seq = self.next_object_seq.max(n + 1);
        }
        if let Some(n) = object
            .shaft_id
            .as_deref()
            .and_then(|s| s.strip_prefix("shaft-"))
            .and_then(|s| s.parse::<u64>().ok())
        {
            self.next_shaft_seq = self.next_shaft_seq.max(n + 1);
        }
    }

    fn validate(
        &self,
        asset: &AssetMetadata,
        position: GridPosition,
        orientation: Orientation,
        floor: i32,
        exclude: &[ObjectId],
    ) -> Result<(), PlacementRejection> {
        let query = PlacementQuery {
            asset,
            position,
            orientation,
            floor,
            exclude,
        };
        check_placement(
            &query,
            &self.grid,
            &self.buildings,
            &self.walls,
            self.config.wall_thickness_ratio,
        )
    }

    /// Delete actions for ground tiles a non-ground placement would
    /// evict. A stacking placement coexists with stacking ground tiles,
    /// so those are left alone.
    fn ground_eviction_actions(
        &self,
        position: GridPosition,
        size: GridSize,
        floor: i32,
        can_stack: bool,
        category: AssetCategory,
    ) -> Vec<HistoryAction> {
        if category.is_ground_tile() {
            return Vec::new();
        }
        let mut seen = HashSet::new();
        let mut actions = Vec::new();
        for cell in rect_cells(position, size) {
            for occupant in self.grid.occupants_at(floor, cell) {
                if occupant.category.is_ground_tile()
                    && !(can_stack && occupant.can_stack)
                    && seen.insert(occupant.id.clone())
                {
                    if let Some(object) = self.objects.get(&occupant.id) {
                        actions.push(HistoryAction::Delete {
                            object: object.clone(),
                        });
                    }
                }
            }
        }
        actions
    }

    /// Place one shaft member per floor of the building, sharing a shaft
    /// id, as a single batch.
    fn place_shaft(
        &mut self,
        asset: &AssetMetadata,
        position: GridPosition,
        orientation: Orientation,
        building_id: BuildingId,
    ) -> Option<ObjectId> {
        let levels = self.buildings.get(&building_id)?.floor_levels();
        for level in &levels {
            if self
                .validate(asset, position, orientation, *level, &[])
                .is_err()
            {
                return None;
            }
        }

        let shaft_id = self.next_shaft_id();
        let mut actions = Vec::new();
        let mut first_id = None;
        for level in levels {
            let id = self.next_object_id();
            first_id.get_or_insert(id.clone());
            let mut object =
                PlacedObject::new(id, asset.id.clone(), position, orientation, level);
            object.building_id = Some(building_id.clone());
            object.shaft_id = Some(shaft_id.clone());
            actions.push(HistoryAction::Place { object });
        }

        for action in &actions {
            self.apply_action(action);
        }
        self.commit(actions);
        first_id
    }

    /// Place actions extending every shaft of a building onto `level`.
    fn shaft_extension_actions(&mut self, building_id: &str, level: i32) -> Vec<HistoryAction> {
        let mut shaft_ids: Vec<String> = self
            .objects
            .in_building(building_id)
            .iter()
            .filter_map(|o| o.shaft_id.clone())
            .collect();
        shaft_ids.sort();
        shaft_ids.dedup();

        let mut actions = Vec::new();
        for shaft_id in shaft_ids {
            let Some(template) = self
                .objects
                .shaft_members(&shaft_id)
                .first()
                .map(|o| (*o).clone())
            else {
                continue;
            };
            let id = self.next_object_id();
            let mut object = PlacedObject::new(
                id,
                template.asset_id.clone(),
                template.position,
                template.orientation,
                level,
            );
            object.building_id = Some(building_id.to_string());
            object.shaft_id = Some(shaft_id);
            actions.push(HistoryAction::Place { object });
        }
        actions
    }

    fn can_translate_building(&self, id: &str, dx: i32, dz: i32) -> bool {
        let Some(building) = self.buildings.get(id) else {
            return false;
        };
        for footprint in &building.footprints {
            let moved = footprint.translated(dx, dz);
            for other in self.buildings.iter() {
                if other.id != id && other.overlaps(&moved) {
                    return false;
                }
            }
        }

        let member_ids: Vec<ObjectId> = self
            .objects
            .in_building(id)
            .iter()
            .map(|o| o.id.clone())
            .collect();
        for mid in &member_ids {
            let member = self.objects.get(mid).expect("member exists");
            let Some(asset) = self.assets.get(&member.asset_id) else {
                continue;
            };
            let size = member.orientation.footprint_size(asset.size);
            if self.grid.is_occupied_excluding(
                member.position.offset(dx, dz),
                size,
                asset.can_stack,
                asset.category,
                member.floor,
                &member_ids,
            ) {
                return false;
            }
        }
        true
    }

    /// Apply one action forward. Both live edits and history replay
    /// funnel through here, so every mutation uses the same primitives.
    fn apply_action(&mut self, action: &HistoryAction) {
        match action {
            HistoryAction::Place { object } => {
                self.insert_object(object.clone());
            }
            HistoryAction::Delete { object } => {
                self.remove_object(&object.id);
            }
            HistoryAction::Move {
                object_id,
                to_position,
                to_orientation,
                to_floor,
                ..
            } => {
                self.relocate_object(object_id, *to_position, *to_orientation, *to_floor);
            }
            HistoryAction::Batch { actions } => {
                for action in actions {
                    self.apply_action(action);
                }
            }
            HistoryAction::BuildingCreate { building, objects } => {
                if !self.buildings.contains(&building.id) {
                    self.buildings.insert(building.clone());
                    self.regenerate_walls(&building.id);
                }
                for object in objects {
                    if !self.objects.contains(&object.id) {
                        self.insert_object(object.clone());
                    }
                }
            }
            HistoryAction::BuildingDelete { building, objects } => {
                for object in objects {
                    self.remove_object(&object.id);
                }
                self.clear_walls(&building.id);
                self.buildings.remove(&building.id);
            }
            HistoryAction::BuildingMove {
                building_id,
                dx,
                dz,
            } => {
                if let Err(err) = self.buildings.translate(building_id, *dx, *dz) {
                    log::warn!("building translate replay failed: {err:?}");
                    return;
                }
                let moves: Vec<(ObjectId, GridPosition, Orientation, i32)> = self
                    .objects
                    .in_building(building_id)
                    .iter()
                    .map(|o| {
                        (
                            o.id.clone(),
                            o.position.offset(*dx, *dz),
                            o.orientation,
                            o.floor,
                        )
                    })
                    .collect();
                for (id, position, orientation, floor) in moves {
                    self.relocate_object(&id, position, orientation, floor);
                }
                self.regenerate_walls(building_id);
            }
            HistoryAction::FloorAdd {
                building_id,
                level,
                height,
            } => {
                if let Err(err) = self.buildings.add_floor_at(building_id, *level, *height) {
                    log::warn!("floor add replay failed: {err:?}");
                    return;
                }
                self.regenerate_walls(building_id);
            }
            HistoryAction::FloorDelete {
                building_id,
                level,
                objects,
                ..
            } => {
                for object in objects {
                    self.remove_object(&object.id);
                }
                if let Err(err) = self.buildings.remove_floor(building_id, *level) {
                    log::warn!("floor delete replay failed: {err:?}");
                    return;
                }
                let _ = self
                    .buildings
                    .shift_floor_levels(building_id, *level + 1, -1);
                self.shift_object_floors(building_id, *level + 1, -1);
                self.regenerate_walls(building_id);
            }
            HistoryAction::FloorInsert {
                building_id,
                level,
                height,
                objects,
            } => {
                let _ = self.buildings.shift_floor_levels(building_id, *level, 1);
                self.shift_object_floors(building_id, *level, 1);
                if let Err(err) = self.buildings.add_floor_at(building_id, *level, *height) {
                    log::warn!("floor insert replay failed: {err:?}");
                }
                for object in objects {
                    self.insert_object(object.clone());
                }
                self.regenerate_walls(building_id);
            }
        }
    }

    /// Renumber the floor field (and occupancy) of a building's objects
    /// at or above `from_level`.
    fn shift_object_floors(&mut self, building_id: &str, from_level: i32, delta: i32) {
        let moves: Vec<(ObjectId, GridPosition, Orientation, i32)> = self
            .objects
            .in_building(building_id)
            .iter()
            .filter(|o| o.floor >= from_level)
            .map(|o| (o.id.clone(), o.position, o.orientation, o.floor + delta))
            .collect();
        for (id, position, orientation, floor) in moves {
            self.relocate_object(&id, position, orientation, floor);
        }
    }

    /// Mutation primitive: register an object and its occupancy.
    fn insert_object(&mut self, object: PlacedObject) {
        let (size, can_stack, category) = match self.assets.get(&object.asset_id) {
            Some(asset) => (
                object.orientation.footprint_size(asset.size),
                asset.can_stack,
                asset.category,
            ),
            None => {
                log::warn!(
                    "object {} references unknown asset {}; assuming 1x1",
                    object.id,
                    object.asset_id
                );
                (GridSize::unit(), false, AssetCategory::StorageUnit)
            }
        };
        let evicted = self.grid.mark_occupied(
            &object.id,
            object.position,
            size,
            can_stack,
            category,
            object.floor,
        );
        // Live paths delete ground tiles before placing; anything left
        // here is a stale record.
        for ground_id in evicted {
            log::warn!("stale ground occupancy {ground_id} evicted");
            self.objects.remove(&ground_id);
        }
        if let Some(attachment) = object.wall_attachment.clone() {
            self.walls.register_opening(&attachment.wall_id, &object.id);
        }
        let id = object.id.clone();
        self.objects.insert(object);
        self.events.emit(&EditorEvent::ObjectPlaced { id });
    }

    /// Mutation primitive: drop an object, its occupancy, its opening
    /// registration, and its selection entry.
    fn remove_object(&mut self, id: &str) -> Option<PlacedObject> {
        let object = self.objects.remove(id)?;
        self.grid.clear_occupied(&object.id);
        self.walls.unregister_opening(&object.id);
        if self.selection.iter().any(|sid| sid == id) {
            let selected: Vec<ObjectId> = self
                .selection
                .iter()
                .filter(|sid| sid.as_str() != id)
                .cloned()
                .collect();
            self.selection = selected.clone();
            self.events
                .emit(&EditorEvent::SelectionChanged { selected });
        }
        self.events.emit(&EditorEvent::ObjectDeleted {
            id: object.id.clone(),
        });
        Some(object)
    }

    /// Mutation primitive: re-pose an object and rewrite its occupancy.
    fn relocate_object(
        &mut self,
        id: &str,
        position: GridPosition,
        orientation: Orientation,
        floor: i32,
    ) {
        let Some(object) = self.objects.get(id).cloned() else {
            log::warn!("relocate of unknown object {id}");
            return;
        };
        let (size, can_stack, category) = match self.assets.get(&object.asset_id) {
            Some(asset) => (
                orientation.footprint_size(asset.size),
                asset.can_stack,
                asset.category,
            ),
            None => (GridSize::unit(), false, AssetCategory::StorageUnit),
        };

        self.grid.clear_occupied(&object.id);
        self.grid
            .mark_occupied(&object.id, position, size, can_stack, category, floor);

        let building_id = self
            .buildings
            .building_at_cell(position.x, position.z)
            .map(|b| b.id.clone());
        let target = self.objects.get_mut(id).expect("object exists");
        target.position = position;
        target.orientation = orientation;
        target.floor = floor;
        // Shaft members keep their building; plain objects follow the
        // cell they stand on.
        if target.shaft_id.is_none() {
            target.building_id = building_id;
        }
    }

    /// Rebuild a building's walls and drop orphaned wall attachments.
    fn regenerate_walls(&mut self, building_id: &str) {
        let Some(building) = self.buildings.get(building_id) else {
            self.clear_walls(building_id);
            return;
        };
        let levels = building.floor_levels();
        let cells = building.cells();
        let orphaned = self
            .walls
            .regenerate_for_building(building_id, &levels, &cells);
        for object_id in orphaned {
            if let Some(object) = self.objects.get_mut(&object_id) {
                object.wall_attachment = None;
            }
        }
    }

    /// Drop a removed building's walls and orphaned attachments.
    fn clear_walls(&mut self, building_id: &str) {
        let orphaned = self.walls.remove_building(building_id);
        for object_id in orphaned {
            if let Some(object) = self.objects.get_mut(&object_id) {
                object.wall_attachment = None;
            }
        }
    }

    /// Push a committed edit and notify.
    fn commit(&mut self, actions: Vec<HistoryAction>) {
        self.history.push_batch(actions);
        self.notify_changed();
    }

    fn notify_changed(&mut self) {
        self.events.emit(&EditorEvent::HistoryChanged {
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        });
        self.events.emit(&EditorEvent::StateUpdated);
    }
}

impl std::fmt::Debug for EditingFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditingFacade")
            .field("objects", &self.objects.len())
            .field("buildings", &self.buildings.len())
            .field("undo_depth", &self.history.undo_depth())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetMetadata;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn asset(
        id: &str,
        category: AssetCategory,
        size: GridSize,
        can_stack: bool,
    ) -> AssetMetadata {
        AssetMetadata {
            id: id.to_string(),
            name: id.to_string(),
            category,
            size,
            can_stack,
            is_smart: false,
            spans_all_floors: false,
        }
    }

    fn test_registry() -> AssetRegistry {
        let mut registry = AssetRegistry::new();
        registry.register(asset("unit", AssetCategory::StorageUnit, GridSize::unit(), false));
        registry.register(asset("unit-2x1", AssetCategory::StorageUnit, GridSize::new(2, 1), false));
        registry.register(asset("paving", AssetCategory::Pavement, GridSize::unit(), false));
        registry.register(asset("grass", AssetCategory::Grass, GridSize::unit(), true));
        registry.register(asset("fence", AssetCategory::Fence, GridSize::unit(), true));
        registry.register(asset("lift", AssetCategory::Elevator, GridSize::unit(), false));
        registry.register(asset("door", AssetCategory::Door, GridSize::unit(), false));
        registry
    }

    fn facade() -> EditingFacade {
        EditingFacade::new(EditorConfig::default(), test_registry())
    }

    fn pos(x: i32, z: i32) -> GridPosition {
        GridPosition::new(x, z)
    }

    /// Grid + building state fingerprint for round-trip comparisons.
    fn state_snapshot(
        facade: &EditingFacade,
    ) -> (
        std::collections::HashMap<crate::grid::CellKey, Vec<(ObjectId, AssetCategory)>>,
        Vec<(BuildingId, Vec<Footprint>, Vec<i32>)>,
        Vec<(ObjectId, GridPosition, i32)>,
    ) {
        let mut buildings: Vec<(BuildingId, Vec<Footprint>, Vec<i32>)> = facade
            .buildings()
            .iter()
            .map(|b| (b.id.clone(), b.footprints.clone(), b.floor_levels()))
            .collect();
        buildings.sort_by(|a, b| a.0.cmp(&b.0));
        let mut objects: Vec<(ObjectId, GridPosition, i32)> = facade
            .objects()
            .iter()
            .map(|o| (o.id.clone(), o.position, o.floor))
            .collect();
        objects.sort_by(|a, b| a.0.cmp(&b.0));
        (facade.grid().snapshot(), buildings, objects)
    }

    // --- Scenario 1 -----------------------------------------------------

    #[test]
    fn occupied_cell_rejects_second_unit() {
        let mut f = facade();
        let id = f.place_object("unit", pos(0, 0), Orientation::North, 0).unwrap();

        let occupants = f.grid().occupants_at(0, pos(0, 0));
        assert_eq!(occupants.len(), 1);
        assert_eq!(occupants[0].id, id);

        assert!(f.place_object("unit", pos(0, 0), Orientation::North, 0).is_none());
        assert_eq!(f.objects().len(), 1);
    }

    // --- Scenario 2 -----------------------------------------------------

    #[test]
    fn upper_floor_outside_building_rejected() {
        let mut f = facade();
        let bld = f.create_building(Footprint::new(0, 2, 0, 2), None);
        f.add_floor(&bld).unwrap();

        assert!(f.place_object("unit", pos(5, 5), Orientation::North, 1).is_none());
        assert!(f.place_object("unit", pos(1, 1), Orientation::North, 1).is_some());
    }

    // --- Scenario 3 -----------------------------------------------------

    #[test]
    fn undo_restores_position_and_occupancy() {
        let mut f = facade();
        let id = f.place_object("unit", pos(0, 0), Orientation::North, 0).unwrap();
        assert!(f.move_object(&id, pos(1, 0), Orientation::North));
        assert!(f.grid().occupants_at(0, pos(0, 0)).is_empty());

        assert!(f.undo());
        assert_eq!(f.objects().get(&id).unwrap().position, pos(0, 0));
        assert_eq!(f.grid().occupants_at(0, pos(0, 0)).len(), 1);
        assert!(f.grid().occupants_at(0, pos(1, 0)).is_empty());
    }

    // --- Scenario 4 -----------------------------------------------------

    #[test]
    fn elevator_spans_every_floor_as_one_batch() {
        let mut f = facade();
        let bld = f.create_building(Footprint::new(0, 3, 0, 3), None);
        f.add_floor(&bld).unwrap();
        let before_depth = f.history().undo_depth();

        f.place_object("lift", pos(1, 1), Orientation::North, 0).unwrap();

        let members: Vec<&PlacedObject> = f
            .objects()
            .iter()
            .filter(|o| o.shaft_id.is_some())
            .collect();
        assert_eq!(members.len(), 2);
        let shaft_id = members[0].shaft_id.clone().unwrap();
        assert!(members.iter().all(|o| o.shaft_id.as_deref() == Some(shaft_id.as_str())));
        let floors: HashSet<i32> = members.iter().map(|o| o.floor).collect();
        assert_eq!(floors, HashSet::from([0, 1]));

        // One batch entry; undo removes both members.
        assert_eq!(f.history().undo_depth(), before_depth + 1);
        assert!(f.undo());
        assert!(f.objects().iter().all(|o| o.shaft_id.is_none()));
    }

    // --- Properties -----------------------------------------------------

    #[test]
    fn occupancy_exclusivity_for_non_stacking_objects() {
        let mut f = facade();
        let a = f.place_object("unit-2x1", pos(0, 0), Orientation::North, 0).unwrap();
        // Overlapping attempts fail...
        assert!(f.place_object("unit", pos(1, 0), Orientation::North, 0).is_none());
        // ...so committed footprints never intersect.
        let b = f.place_object("unit", pos(2, 0), Orientation::North, 0).unwrap();

        let cells_a: HashSet<_> = f.grid().cells_of(&a).iter().copied().collect();
        let cells_b: HashSet<_> = f.grid().cells_of(&b).iter().copied().collect();
        assert!(cells_a.is_disjoint(&cells_b));
    }

    #[test]
    fn undo_redo_round_trip_reproduces_state() {
        let mut f = facade();
        let initial = state_snapshot(&f);

        let a = f.place_object("unit", pos(0, 0), Orientation::North, 0).unwrap();
        f.place_object("unit-2x1", pos(3, 3), Orientation::East, 0).unwrap();
        f.move_object(&a, pos(1, 1), Orientation::South);
        let bld = f.create_building(Footprint::new(10, 12, 10, 12), None);
        f.add_floor(&bld).unwrap();
        f.place_object("unit", pos(11, 11), Orientation::North, 1).unwrap();
        f.delete_object(&a);
        let edited = state_snapshot(&f);
        let steps = f.history().undo_depth();

        for _ in 0..steps {
            assert!(f.undo());
        }
        assert!(!f.undo());
        assert_eq!(state_snapshot(&f), initial);

        for _ in 0..steps {
            assert!(f.redo());
        }
        assert!(!f.redo());
        assert_eq!(state_snapshot(&f), edited);
    }

    #[test]
    fn merge_then_demolish_restores_footprints() {
        let mut f = facade();
        let a = f.create_building(Footprint::new(0, 2, 0, 2), None);
        let pre = f.buildings().get(&a).unwrap().footprints.clone();

        // Overlapping create merges into A.
        let merged = f.create_building(Footprint::new(2, 4, 0, 2), None);
        assert_eq!(merged, a);
        assert_eq!(f.buildings().len(), 1);

        // Demolish the annexed cells (those not in the original footprint).
        let annexed: Vec<GridPosition> = Footprint::new(2, 4, 0, 2)
            .cells()
            .filter(|c| !pre.iter().any(|fp| fp.contains(c.x, c.z)))
            .collect();
        assert!(f.demolish_cells(&a, &annexed));

        let post = f.buildings().get(&a).unwrap();
        let pre_cells: HashSet<GridPosition> = pre.iter().flat_map(|fp| fp.cells()).collect();
        let post_cells: HashSet<GridPosition> = post.cells();
        assert_eq!(pre_cells, post_cells);
    }

    #[test]
    fn floor_insert_then_delete_restores_levels() {
        let mut f = facade();
        let bld = f.create_building(Footprint::new(0, 3, 0, 3), None);
        f.add_floor(&bld).unwrap();
        f.add_floor(&bld).unwrap();
        let on_one = f.place_object("unit", pos(1, 1), Orientation::North, 1).unwrap();
        let on_two = f.place_object("unit", pos(2, 2), Orientation::North, 2).unwrap();

        assert!(f.insert_floor(&bld, 1));
        assert_eq!(f.buildings().get(&bld).unwrap().floor_levels(), vec![0, 1, 2, 3]);
        assert_eq!(f.objects().get(&on_one).unwrap().floor, 2);
        assert_eq!(f.objects().get(&on_two).unwrap().floor, 3);

        assert!(f.delete_floor(&bld, 1));
        assert_eq!(f.buildings().get(&bld).unwrap().floor_levels(), vec![0, 1, 2]);
        assert_eq!(f.objects().get(&on_one).unwrap().floor, 1);
        assert_eq!(f.objects().get(&on_two).unwrap().floor, 2);
    }

    // --- Ground tiles ---------------------------------------------------

    #[test]
    fn ground_eviction_is_undoable() {
        let mut f = facade();
        let paving = f.place_object("paving", pos(0, 0), Orientation::North, 0).unwrap();
        let unit = f.place_object("unit", pos(0, 0), Orientation::North, 0).unwrap();

        // The ground tile was deleted by the placement batch.
        assert!(f.objects().get(&paving).is_none());
        assert!(f.objects().get(&unit).is_some());

        // Undo restores the ground tile and removes the unit.
        assert!(f.undo());
        assert!(f.objects().get(&paving).is_some());
        assert!(f.objects().get(&unit).is_none());
    }

    #[test]
    fn stacking_fence_leaves_grass_in_place() {
        let mut f = facade();
        let grass = f.place_object("grass", pos(0, 0), Orientation::North, 0).unwrap();
        let fence = f.place_object("fence", pos(0, 0), Orientation::North, 0).unwrap();

        assert!(f.objects().get(&grass).is_some());
        assert!(f.objects().get(&fence).is_some());
        assert_eq!(f.grid().occupants_at(0, pos(0, 0)).len(), 2);

        // A non-stacking unit is still excluded by the fence.
        assert!(f.place_object("unit", pos(0, 0), Orientation::North, 0).is_none());
    }

    #[test]
    fn check_reports_unknown_asset() {
        let f = facade();
        assert_eq!(
            f.check("mystery", pos(0, 0), Orientation::North, 0),
            Err(PlacementRejection::UnknownAsset)
        );
        assert_eq!(f.check("unit", pos(0, 0), Orientation::North, 0), Ok(()));
    }

    // --- Buildings ------------------------------------------------------

    #[test]
    fn building_create_generates_walls_and_undo_removes_them() {
        let mut f = facade();
        let bld = f.create_building(Footprint::new(0, 2, 0, 2), None);
        assert_eq!(f.walls().segment_count(), 4);

        assert!(f.undo());
        assert!(f.buildings().get(&bld).is_none());
        assert_eq!(f.walls().segment_count(), 0);

        assert!(f.redo());
        assert!(f.buildings().get(&bld).is_some());
        assert_eq!(f.walls().segment_count(), 4);
    }

    #[test]
    fn delete_building_takes_contents_and_undo_restores_them() {
        let mut f = facade();
        let bld = f.create_building(Footprint::new(0, 2, 0, 2), None);
        let inside = f.place_object("unit", pos(1, 1), Orientation::North, 0).unwrap();

        assert!(f.delete_building(&bld));
        assert!(f.objects().get(&inside).is_none());
        assert!(f.grid().occupants_at(0, pos(1, 1)).is_empty());

        assert!(f.undo());
        assert!(f.buildings().get(&bld).is_some());
        assert_eq!(f.objects().get(&inside).unwrap().building_id.as_deref(), Some(bld.as_str()));
    }

    #[test]
    fn translate_building_moves_contents() {
        let mut f = facade();
        let bld = f.create_building(Footprint::new(0, 2, 0, 2), None);
        let inside = f.place_object("unit", pos(1, 1), Orientation::North, 0).unwrap();

        assert!(f.translate_building(&bld, 5, 0));
        assert_eq!(
            f.buildings().get(&bld).unwrap().footprints,
            vec![Footprint::new(5, 7, 0, 2)]
        );
        assert_eq!(f.objects().get(&inside).unwrap().position, pos(6, 1));
        assert!(f.grid().occupants_at(0, pos(1, 1)).is_empty());

        assert!(f.undo());
        assert_eq!(f.objects().get(&inside).unwrap().position, pos(1, 1));
        assert_eq!(
            f.buildings().get(&bld).unwrap().footprints,
            vec![Footprint::new(0, 2, 0, 2)]
        );
    }

    #[test]
    fn translate_rejected_when_contents_collide() {
        let mut f = facade();
        let bld = f.create_building(Footprint::new(0, 2, 0, 2), None);
        f.place_object("unit", pos(1, 1), Orientation::North, 0).unwrap();
        // An outdoor blocker where the contained unit would land.
        f.place_object("unit", pos(6, 1), Orientation::North, 0).unwrap();

        assert!(!f.translate_building(&bld, 5, 0));
        assert_eq!(
            f.buildings().get(&bld).unwrap().footprints,
            vec![Footprint::new(0, 2, 0, 2)]
        );
    }

    // --- Floors and shafts ----------------------------------------------

    #[test]
    fn add_floor_extends_existing_shaft() {
        let mut f = facade();
        let bld = f.create_building(Footprint::new(0, 3, 0, 3), None);
        f.place_object("lift", pos(1, 1), Orientation::North, 0).unwrap();
        assert_eq!(f.objects().len(), 1);

        f.add_floor(&bld).unwrap();
        let members: Vec<&PlacedObject> = f
            .objects()
            .iter()
            .filter(|o| o.shaft_id.is_some())
            .collect();
        assert_eq!(members.len(), 2);
        let floors: HashSet<i32> = members.iter().map(|o| o.floor).collect();
        assert_eq!(floors, HashSet::from([0, 1]));

        // Undo takes the floor and the shaft extension together.
        assert!(f.undo());
        assert_eq!(f.objects().len(), 1);
        assert_eq!(f.buildings().get(&bld).unwrap().floor_levels(), vec![0]);
    }

    #[test]
    fn shaft_members_move_together() {
        let mut f = facade();
        let bld = f.create_building(Footprint::new(0, 3, 0, 3), None);
        f.add_floor(&bld).unwrap();
        let lift = f.place_object("lift", pos(1, 1), Orientation::North, 0).unwrap();

        assert!(f.move_object(&lift, pos(2, 2), Orientation::North));
        for member in f.objects().iter().filter(|o| o.shaft_id.is_some()) {
            assert_eq!(member.position, pos(2, 2));
        }
    }

    #[test]
    fn shaft_members_delete_together() {
        let mut f = facade();
        let bld = f.create_building(Footprint::new(0, 3, 0, 3), None);
        f.add_floor(&bld).unwrap();
        let lift = f.place_object("lift", pos(1, 1), Orientation::North, 0).unwrap();
        assert_eq!(f.objects().len(), 2);

        assert!(f.delete_object(&lift));
        assert!(f.objects().is_empty());
    }

    #[test]
    fn deleted_floor_carries_objects_through_undo() {
        let mut f = facade();
        let bld = f.create_building(Footprint::new(0, 3, 0, 3), None);
        f.add_floor(&bld).unwrap();
        let upstairs = f.place_object("unit", pos(1, 1), Orientation::North, 1).unwrap();

        assert!(f.delete_floor(&bld, 1));
        assert!(f.objects().get(&upstairs).is_none());

        assert!(f.undo());
        let restored = f.objects().get(&upstairs).unwrap();
        assert_eq!(restored.floor, 1);
        assert_eq!(f.buildings().get(&bld).unwrap().floor_levels(), vec![0, 1]);
    }

    // --- Interactive move ----------------------------------------------

    #[test]
    fn interactive_move_commits_one_history_entry() {
        let mut f = facade();
        let id = f.place_object("unit", pos(0, 0), Orientation::North, 0).unwrap();
        let depth = f.history().undo_depth();

        assert!(f.begin_interactive_move(&id));
        assert!(f.update_interactive_move(1, 0));
        assert!(f.update_interactive_move(1, 0));
        assert!(f.update_interactive_move(0, 2));
        // Occupancy untouched while dragging.
        assert_eq!(f.grid().occupants_at(0, pos(0, 0)).len(), 1);

        assert!(f.commit_interactive_move());
        assert_eq!(f.objects().get(&id).unwrap().position, pos(2, 2));
        assert_eq!(f.history().undo_depth(), depth + 1);

        // One undo reverts the whole gesture.
        assert!(f.undo());
        assert_eq!(f.objects().get(&id).unwrap().position, pos(0, 0));
    }

    #[test]
    fn cancel_discards_gesture_without_history() {
        let mut f = facade();
        let id = f.place_object("unit", pos(0, 0), Orientation::North, 0).unwrap();
        let depth = f.history().undo_depth();

        f.begin_interactive_move(&id);
        f.update_interactive_move(4, 4);
        f.cancel_interactive_move();

        assert_eq!(f.objects().get(&id).unwrap().position, pos(0, 0));
        assert_eq!(f.history().undo_depth(), depth);
        assert!(f.pending_move().is_none());
    }

    #[test]
    fn failed_commit_reverts_and_writes_no_history() {
        let mut f = facade();
        let id = f.place_object("unit", pos(0, 0), Orientation::North, 0).unwrap();
        f.place_object("unit", pos(3, 0), Orientation::North, 0).unwrap();
        let depth = f.history().undo_depth();

        f.begin_interactive_move(&id);
        f.update_interactive_move(3, 0);
        assert!(!f.commit_interactive_move());

        assert_eq!(f.objects().get(&id).unwrap().position, pos(0, 0));
        assert_eq!(f.history().undo_depth(), depth);
    }

    #[test]
    fn only_one_gesture_in_flight() {
        let mut f = facade();
        let a = f.place_object("unit", pos(0, 0), Orientation::North, 0).unwrap();
        let b = f.place_object("unit", pos(5, 5), Orientation::North, 0).unwrap();

        assert!(f.begin_interactive_move(&a));
        assert!(!f.begin_interactive_move(&b));
        f.cancel_interactive_move();
        assert!(f.begin_interactive_move(&b));
    }

    // --- Batch paste ----------------------------------------------------

    #[test]
    fn paste_commits_atomically_and_skips_rejects() {
        let mut f = facade();
        f.place_object("unit", pos(1, 0), Orientation::North, 0).unwrap();
        let depth = f.history().undo_depth();

        let ids = f.paste_objects(&[
            ("unit".to_string(), pos(0, 0), Orientation::North, 0),
            ("unit".to_string(), pos(1, 0), Orientation::North, 0), // occupied
            ("unit".to_string(), pos(2, 0), Orientation::North, 0),
        ]);
        assert_eq!(ids.len(), 2);
        assert_eq!(f.history().undo_depth(), depth + 1);

        // One undo removes the whole paste.
        assert!(f.undo());
        assert!(f.objects().get(&ids[0]).is_none());
        assert!(f.objects().get(&ids[1]).is_none());
    }

    // --- Events ---------------------------------------------------------

    #[test]
    fn placement_emits_events_in_order() {
        let mut f = facade();
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        f.subscribe(move |event| {
            sink.borrow_mut().push(match event {
                EditorEvent::StateUpdated => "state",
                EditorEvent::ObjectPlaced { .. } => "placed",
                EditorEvent::ObjectDeleted { .. } => "deleted",
                EditorEvent::SelectionChanged { .. } => "selection",
                EditorEvent::HistoryChanged { .. } => "history",
            });
        });

        f.place_object("unit", pos(0, 0), Orientation::North, 0).unwrap();
        assert_eq!(*log.borrow(), vec!["placed", "history", "state"]);
    }

    #[test]
    fn selection_follows_deletion() {
        let mut f = facade();
        let id = f.place_object("unit", pos(0, 0), Orientation::North, 0).unwrap();
        f.set_selection(vec![id.clone(), "ghost".to_string()]);
        assert_eq!(f.selection(), &[id.clone()]);

        f.delete_object(&id);
        assert!(f.selection().is_empty());
    }

    // --- Wall openings --------------------------------------------------

    #[test]
    fn door_attaches_to_wall_and_detaches_on_demolition() {
        use crate::building::WallAxis;

        let mut f = facade();
        let bld = f.create_building(Footprint::new(0, 2, 0, 2), None);
        let door = f.place_object("door", pos(1, 0), Orientation::North, 0).unwrap();
        let wall_id = f
            .walls()
            .segments_of_building(&bld)
            .iter()
            .find(|s| s.axis == WallAxis::X && s.line == 0)
            .map(|s| s.id.clone())
            .unwrap();

        assert!(f.attach_to_wall(&door, &wall_id, 0.5));
        assert_eq!(f.walls().openings_of(&wall_id), &[door.clone()]);

        // Demolishing a cell on the z=0 edge shortens that wall; the
        // regenerated segment has a new id and the attachment is dropped.
        assert!(f.demolish_cells(&bld, &[pos(2, 0)]));
        assert!(f.objects().get(&door).unwrap().wall_attachment.is_none());
    }

    #[test]
    fn untouched_walls_keep_attachments_through_edits() {
        use crate::building::WallAxis;

        let mut f = facade();
        let bld = f.create_building(Footprint::new(0, 2, 0, 2), None);
        let door = f.place_object("door", pos(1, 0), Orientation::North, 0).unwrap();
        let wall_id = f
            .walls()
            .segments_of_building(&bld)
            .iter()
            .find(|s| s.axis == WallAxis::X && s.line == 0)
            .map(|s| s.id.clone())
            .unwrap();
        assert!(f.attach_to_wall(&door, &wall_id, 0.5));

        // Demolishing the far corner leaves the z=0 run intact.
        assert!(f.demolish_cells(&bld, &[pos(2, 2)]));
        let attachment = f.objects().get(&door).unwrap().wall_attachment.clone();
        assert_eq!(attachment.map(|a| a.wall_id), Some(wall_id));
    }
}
