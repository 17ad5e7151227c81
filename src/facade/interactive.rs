//! Interactive Move Gesture
//!
//! Two-phase API for continuous drag input: begin, stream deltas, then
//! commit (validated once) or cancel (all deltas discarded, no history
//! entry). The host decides how to schedule the debounce window; the core
//! owns no timer and only ever has one gesture in flight.

use crate::grid::{GridPosition, Orientation};
use crate::objects::ObjectId;

/// Lifecycle of a move gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureState {
    /// Begun, no delta received yet
    Started,
    /// At least one delta or rotation applied
    Dragging,
}

/// An in-flight, uncommitted move of one object.
///
/// Holds the starting pose so cancellation (or a failed commit) can
/// discard every delta. The object's occupancy records stay at the start
/// pose until commit; validation excludes the mover's own cells.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractiveMove {
    /// Object being dragged
    pub object_id: ObjectId,
    /// Shaft siblings that move with it (empty for plain objects)
    pub linked_ids: Vec<ObjectId>,
    pub state: GestureState,
    /// Pose when the gesture began
    pub start_position: GridPosition,
    pub start_orientation: Orientation,
    /// Current (pending) pose
    pub position: GridPosition,
    pub orientation: Orientation,
    /// Floor the gesture is happening on (moves never change floor)
    pub floor: i32,
}

impl InteractiveMove {
    pub fn new(
        object_id: ObjectId,
        linked_ids: Vec<ObjectId>,
        position: GridPosition,
        orientation: Orientation,
        floor: i32,
    ) -> Self {
        Self {
            object_id,
            linked_ids,
            state: GestureState::Started,
            start_position: position,
            start_orientation: orientation,
            position,
            orientation,
            floor,
        }
    }

    /// Accumulate a cell delta.
    pub fn apply_delta(&mut self, dx: i32, dz: i32) {
        self.position = self.position.offset(dx, dz);
        self.state = GestureState::Dragging;
    }

    /// Rotate the pending pose 90 degrees clockwise.
    pub fn rotate_cw(&mut self) {
        self.orientation = self.orientation.rotated_cw();
        self.state = GestureState::Dragging;
    }

    /// Has the pose actually changed since the gesture began?
    ///
    /// A commit with no net change writes no history entry.
    pub fn has_moved(&self) -> bool {
        self.position != self.start_position || self.orientation != self.start_orientation
    }

    /// Net cell delta accumulated so far.
    pub fn delta(&self) -> (i32, i32) {
        (
            self.position.x - self.start_position.x,
            self.position.z - self.start_position.z,
        )
    }
}
