//! Editor Configuration
//!
//! Centralized configuration for the spatial editing core.
//! Replaces hardcoded constants scattered across the grid, wall, and
//! history modules so hosts can tune the editor in one place.

/// Default world size of one grid cell (meters).
pub const DEFAULT_CELL_SIZE: f32 = 2.0;

/// Default maximum undo/redo depth.
pub const DEFAULT_HISTORY_DEPTH: usize = 100;

/// Default debounce window for coalescing continuous drag input (ms).
///
/// Advisory only: the core exposes a two-phase interactive-move API and
/// never owns a timer. Hosts that stream move deltas should flush a
/// gesture after this much idle time.
pub const DEFAULT_MOVE_DEBOUNCE_MS: u64 = 150;

/// Default height of a newly created floor (meters).
pub const DEFAULT_FLOOR_HEIGHT: f32 = 3.0;

/// Central configuration for the editing core.
///
/// `Default` returns the stock values above.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EditorConfig {
    /// World size of one grid cell (meters)
    pub cell_size: f32,
    /// Maximum number of entries kept on each history stack
    pub max_history_depth: usize,
    /// Advisory debounce window for drag gestures (ms)
    pub move_debounce_ms: u64,
    /// Height assigned to newly created floors (meters)
    pub default_floor_height: f32,
    /// Wall slab thickness as a fraction of `cell_size`
    pub wall_thickness_ratio: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            max_history_depth: DEFAULT_HISTORY_DEPTH,
            move_debounce_ms: DEFAULT_MOVE_DEBOUNCE_MS,
            default_floor_height: DEFAULT_FLOOR_HEIGHT,
            wall_thickness_ratio: crate::building::walls::WALL_THICKNESS_RATIO,
        }
    }
}

impl EditorConfig {
    /// Absolute wall slab thickness in world units.
    pub fn wall_thickness(&self) -> f32 {
        self.cell_size * self.wall_thickness_ratio
    }
}
