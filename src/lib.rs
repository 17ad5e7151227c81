//! Depot Forge
//!
//! Spatial editing core for 3D storage-facility layouts: a cell-grid
//! occupancy store, a building/floor model with derived walls, placement
//! validation, invertible undo/redo history, and versioned document
//! persistence, all behind a single editing facade.
//!
//! # Modules
//!
//! - [`grid`] - Integer cell coordinates, grid/world transforms, per-floor occupancy
//! - [`building`] - Footprints, the building/floor registry, derived wall geometry
//! - [`objects`] - Placed objects and their id-keyed store
//! - [`validator`] - Pure placement/move rule checks
//! - [`history`] - Bounded, invertible undo/redo stacks
//! - [`events`] - Synchronous change notifications
//! - [`facade`] - [`EditingFacade`], the single entry point for every edit
//! - [`document`] - Versioned JSON import/export
//! - [`assets`] - Asset metadata consumed from an external catalog
//! - [`config`] - Central editor configuration
//!
//! # Example
//!
//! ```
//! use depot_forge::{
//!     AssetCategory, AssetMetadata, AssetRegistry, EditingFacade, EditorConfig, Footprint,
//!     GridPosition, GridSize, Orientation,
//! };
//!
//! let mut assets = AssetRegistry::new();
//! assets.register(AssetMetadata {
//!     id: "unit-10x10".to_string(),
//!     name: "Storage Unit 10x10".to_string(),
//!     category: AssetCategory::StorageUnit,
//!     size: GridSize::new(2, 2),
//!     can_stack: false,
//!     is_smart: false,
//!     spans_all_floors: false,
//! });
//!
//! let mut editor = EditingFacade::new(EditorConfig::default(), assets);
//! let building = editor.create_building(Footprint::new(0, 5, 0, 5), None);
//! editor.add_floor(&building);
//!
//! let unit = editor
//!     .place_object("unit-10x10", GridPosition::new(1, 1), Orientation::North, 0)
//!     .expect("placement is valid");
//! editor.move_object(&unit, GridPosition::new(3, 3), Orientation::East);
//! editor.undo();
//! ```

pub mod assets;
pub mod building;
pub mod config;
pub mod document;
pub mod events;
pub mod facade;
pub mod grid;
pub mod history;
pub mod objects;
pub mod validator;

pub use assets::{AssetCategory, AssetId, AssetMetadata, AssetRegistry, GridSize};
pub use building::{
    Building, BuildingId, BuildingOpError, BuildingRegistry, Floor, Footprint, WallAxis, WallId,
    WallSegment, WallSet,
};
pub use config::EditorConfig;
pub use document::{DocumentError, LoadReport, export_document, import_document};
pub use events::{EditorEvent, EventBus, SubscriberId};
pub use facade::{EditingFacade, InteractiveMove};
pub use grid::{CellMetrics, GridPosition, OccupancyGrid, Orientation};
pub use history::{ActionHistory, HistoryAction};
pub use objects::{Binding, ObjectId, ObjectStore, PlacedObject, WallAttachment};
pub use validator::{PlacementQuery, PlacementRejection, check_placement};
