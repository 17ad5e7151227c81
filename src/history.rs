//! Action History (Undo/Redo)
//!
//! Every committed edit pushes an invertible [`HistoryAction`] onto a
//! bounded undo stack. Undo pops an action, hands it to the caller for
//! inversion, and parks it on the redo stack; a fresh edit clears the
//! redo future. Inversion itself is a pure function per variant so the
//! logic lives in one place instead of being scattered across call sites.

use crate::building::{Building, BuildingId};
use crate::grid::{GridPosition, Orientation};
use crate::objects::{ObjectId, PlacedObject};

/// Default maximum depth of each history stack.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// One invertible edit.
///
/// Each variant carries exactly the data its inverse needs: a deleted
/// floor keeps its object list so undo restores them, a building delete
/// keeps its contained objects, and so on.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryAction {
    /// An object was placed
    Place { object: PlacedObject },
    /// An object was deleted
    Delete { object: PlacedObject },
    /// An object was moved and/or rotated (and possibly changed floor)
    Move {
        object_id: ObjectId,
        from_position: GridPosition,
        to_position: GridPosition,
        from_orientation: Orientation,
        to_orientation: Orientation,
        from_floor: i32,
        to_floor: i32,
    },
    /// Several actions committed as one atomic unit (paste, shafts, merge)
    Batch { actions: Vec<HistoryAction> },
    /// A building came into existence, restoring `objects` with it
    /// (empty on a fresh create; populated when undoing a delete)
    BuildingCreate {
        building: Building,
        objects: Vec<PlacedObject>,
    },
    /// A building was removed together with its contained objects
    BuildingDelete {
        building: Building,
        objects: Vec<PlacedObject>,
    },
    /// A building (and its contents) was translated by a cell delta
    BuildingMove {
        building_id: BuildingId,
        dx: i32,
        dz: i32,
    },
    /// A floor was appended on top of a building
    FloorAdd {
        building_id: BuildingId,
        level: i32,
        height: f32,
    },
    /// The floor at `level` was removed: its objects deleted and higher
    /// floors shifted down
    FloorDelete {
        building_id: BuildingId,
        level: i32,
        height: f32,
        objects: Vec<PlacedObject>,
    },
    /// A floor was inserted at `level`: higher floors shifted up and the
    /// carried objects restored onto it
    FloorInsert {
        building_id: BuildingId,
        level: i32,
        height: f32,
        objects: Vec<PlacedObject>,
    },
}

impl HistoryAction {
    /// The action that exactly undoes this one.
    ///
    /// `Batch` inverts its members in reverse order so a composite undo
    /// unwinds the way it was wound.
    pub fn inverse(&self) -> HistoryAction {
        match self {
            HistoryAction::Place { object } => HistoryAction::Delete {
                object: object.clone(),
            },
            HistoryAction::Delete { object } => HistoryAction::Place {
                object: object.clone(),
            },
            HistoryAction::Move {
                object_id,
                from_position,
                to_position,
                from_orientation,
                to_orientation,
                from_floor,
                to_floor,
            } => HistoryAction::Move {
                object_id: object_id.clone(),
                from_position: *to_position,
                to_position: *from_position,
                from_orientation: *to_orientation,
                to_orientation: *from_orientation,
                from_floor: *to_floor,
                to_floor: *from_floor,
            },
            HistoryAction::Batch { actions } => HistoryAction::Batch {
                actions: actions.iter().rev().map(|a| a.inverse()).collect(),
            },
            HistoryAction::BuildingCreate { building, objects } => HistoryAction::BuildingDelete {
                building: building.clone(),
                objects: objects.clone(),
            },
            HistoryAction::BuildingDelete { building, objects } => HistoryAction::BuildingCreate {
                building: building.clone(),
                objects: objects.clone(),
            },
            HistoryAction::BuildingMove {
                building_id,
                dx,
                dz,
            } => HistoryAction::BuildingMove {
                building_id: building_id.clone(),
                dx: -dx,
                dz: -dz,
            },
            HistoryAction::FloorAdd {
                building_id,
                level,
                height,
            } => HistoryAction::FloorDelete {
                building_id: building_id.clone(),
                level: *level,
                height: *height,
                objects: Vec::new(),
            },
            HistoryAction::FloorDelete {
                building_id,
                level,
                height,
                objects,
            } => HistoryAction::FloorInsert {
                building_id: building_id.clone(),
                level: *level,
                height: *height,
                objects: objects.clone(),
            },
            HistoryAction::FloorInsert {
                building_id,
                level,
                height,
                objects,
            } => HistoryAction::FloorDelete {
                building_id: building_id.clone(),
                level: *level,
                height: *height,
                objects: objects.clone(),
            },
        }
    }
}

/// Two bounded stacks of committed actions.
///
/// The stacks are always disjoint; total entries never exceed twice the
/// maximum depth.
#[derive(Debug)]
pub struct ActionHistory {
    undo_stack: Vec<HistoryAction>,
    redo_stack: Vec<HistoryAction>,
    max_depth: usize,
}

impl Default for ActionHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl ActionHistory {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Record a committed edit. Clears the redo future and evicts the
    /// oldest entry when over capacity.
    pub fn push(&mut self, action: HistoryAction) {
        self.redo_stack.clear();
        self.undo_stack.push(action);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
    }

    /// Record several actions as one atomic entry. A single action is
    /// pushed plain; an empty list is a no-op.
    pub fn push_batch(&mut self, mut actions: Vec<HistoryAction>) {
        match actions.len() {
            0 => {}
            1 => self.push(actions.remove(0)),
            _ => self.push(HistoryAction::Batch { actions }),
        }
    }

    /// Pop the most recent edit for the caller to invert. Returns `None`
    /// on an empty stack (a no-op, not an error).
    pub fn undo(&mut self) -> Option<HistoryAction> {
        let action = self.undo_stack.pop()?;
        self.redo_stack.push(action.clone());
        if self.redo_stack.len() > self.max_depth {
            self.redo_stack.remove(0);
        }
        Some(action)
    }

    /// Pop the most recently undone edit for the caller to re-apply.
    pub fn redo(&mut self) -> Option<HistoryAction> {
        let action = self.redo_stack.pop()?;
        self.undo_stack.push(action.clone());
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        Some(action)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Drop all history (document import, facility reset).
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
