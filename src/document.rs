//! Document Import/Export
//!
//! Versioned JSON persistence of the facility. Version 2 is the current
//! format: buildings and object records referencing assets by id, plus
//! opaque camera state. Version 1 is the legacy format whose object
//! records embed their full asset metadata inline; importing one
//! registers that metadata so the records resolve without a catalog.
//!
//! Import is forgiving at the record level: a malformed building or
//! object record is skipped with a warning and counted in the
//! [`LoadReport`], never failing the whole document. Unknown versions and
//! unparseable documents are hard errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::assets::AssetMetadata;
use crate::building::Building;
use crate::facade::EditingFacade;
use crate::objects::PlacedObject;

/// Format version written by [`export_document`].
pub const DOCUMENT_VERSION: u32 = 2;

/// Why a document could not be loaded at all.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("malformed document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unsupported document version {0}")]
    UnsupportedVersion(u32),
}

/// What an import actually loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Version of the imported document
    pub version: u32,
    pub buildings_loaded: usize,
    pub objects_loaded: usize,
    /// Records dropped because they were malformed or referenced an
    /// unknown asset
    pub records_skipped: usize,
}

#[derive(Serialize)]
struct DocumentOut<'a> {
    version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    camera: Option<&'a serde_json::Value>,
    buildings: Vec<&'a Building>,
    objects: Vec<&'a PlacedObject>,
}

/// Legacy (v1) object record: the placement fields plus inline metadata.
#[derive(Deserialize)]
struct LegacyObjectRecord {
    #[serde(flatten)]
    object: PlacedObject,
    asset: AssetMetadata,
}

/// Serialize the whole facility as a current-version JSON document.
///
/// Buildings and objects are emitted sorted by id so the output is
/// stable. History and selection are session state and not persisted.
pub fn export_document(facade: &EditingFacade) -> Result<String, DocumentError> {
    let mut buildings: Vec<&Building> = facade.buildings().iter().collect();
    buildings.sort_by(|a, b| a.id.cmp(&b.id));
    let mut objects: Vec<&PlacedObject> = facade.objects().iter().collect();
    objects.sort_by(|a, b| a.id.cmp(&b.id));

    let doc = DocumentOut {
        version: DOCUMENT_VERSION,
        camera: facade.camera(),
        buildings,
        objects,
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// Replace the facade's state with the document's contents.
///
/// Existing state and history are dropped before loading. Buildings are
/// restored first so walls exist when object attachments are checked;
/// an attachment naming a wall that no longer exists is dropped.
pub fn import_document(
    facade: &mut EditingFacade,
    json: &str,
) -> Result<LoadReport, DocumentError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    // Legacy documents predate the version field.
    let version = value
        .get("version")
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(1) as u32;

    let report = match version {
        1 => import_v1(facade, &value, version),
        2 => import_v2(facade, &value, version),
        other => return Err(DocumentError::UnsupportedVersion(other)),
    };
    facade.notify_imported();
    Ok(report)
}

fn import_v2(facade: &mut EditingFacade, value: &serde_json::Value, version: u32) -> LoadReport {
    let mut report = LoadReport {
        version,
        ..LoadReport::default()
    };
    facade.reset();
    facade.set_camera(value.get("camera").cloned());

    for record in array_of(value, "buildings") {
        match serde_json::from_value::<Building>(record.clone()) {
            Ok(building) => {
                facade.restore_building(building);
                report.buildings_loaded += 1;
            }
            Err(err) => {
                log::warn!("skipping malformed building record: {err}");
                report.records_skipped += 1;
            }
        }
    }

    for record in array_of(value, "objects") {
        let object = match serde_json::from_value::<PlacedObject>(record.clone()) {
            Ok(object) => object,
            Err(err) => {
                log::warn!("skipping malformed object record: {err}");
                report.records_skipped += 1;
                continue;
            }
        };
        let Some(asset) = facade.assets().get(&object.asset_id).cloned() else {
            log::warn!(
                "skipping object {}: unknown asset {}",
                object.id,
                object.asset_id
            );
            report.records_skipped += 1;
            continue;
        };
        facade.restore_object(object, &asset);
        report.objects_loaded += 1;
    }

    report
}

fn import_v1(facade: &mut EditingFacade, value: &serde_json::Value, version: u32) -> LoadReport {
    let mut report = LoadReport {
        version,
        ..LoadReport::default()
    };
    facade.reset();
    facade.set_camera(value.get("camera").cloned());

    for record in array_of(value, "buildings") {
        match serde_json::from_value::<Building>(record.clone()) {
            Ok(building) => {
                facade.restore_building(building);
                report.buildings_loaded += 1;
            }
            Err(err) => {
                log::warn!("skipping malformed building record: {err}");
                report.records_skipped += 1;
            }
        }
    }

    for record in array_of(value, "objects") {
        match serde_json::from_value::<LegacyObjectRecord>(record.clone()) {
            Ok(LegacyObjectRecord { object, asset }) => {
                facade.register_asset(asset.clone());
                facade.restore_object(object, &asset);
                report.objects_loaded += 1;
            }
            Err(err) => {
                log::warn!("skipping malformed legacy object record: {err}");
                report.records_skipped += 1;
            }
        }
    }

    report
}

fn array_of<'a>(value: &'a serde_json::Value, key: &str) -> &'a [serde_json::Value] {
    value
        .get(key)
        .and_then(serde_json::Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetCategory, AssetRegistry, GridSize};
    use crate::building::Footprint;
    use crate::config::EditorConfig;
    use crate::grid::{GridPosition, Orientation};
    use serde_json::json;

    fn registry() -> AssetRegistry {
        let mut registry = AssetRegistry::new();
        registry.register(AssetMetadata {
            id: "unit".to_string(),
            name: "Storage Unit".to_string(),
            category: AssetCategory::StorageUnit,
            size: GridSize::new(2, 1),
            can_stack: false,
            is_smart: false,
            spans_all_floors: false,
        });
        registry.register(AssetMetadata {
            id: "door".to_string(),
            name: "Door".to_string(),
            category: AssetCategory::Door,
            size: GridSize::new(1, 1),
            can_stack: false,
            is_smart: false,
            spans_all_floors: false,
        });
        registry
    }

    fn facade() -> EditingFacade {
        EditingFacade::new(EditorConfig::default(), registry())
    }

    #[test]
    fn export_import_round_trip() {
        let mut source = facade();
        let bld = source.create_building(Footprint::new(0, 3, 0, 3), Some("Depot A".to_string()));
        source.add_floor(&bld).unwrap();
        let inside = source
            .place_object("unit", GridPosition::new(1, 1), Orientation::East, 1)
            .unwrap();
        source
            .place_object("unit", GridPosition::new(10, 10), Orientation::North, 0)
            .unwrap();
        source.set_camera(Some(json!({"yaw": 0.5, "distance": 40.0})));

        let json = export_document(&source).unwrap();
        let mut target = facade();
        let report = import_document(&mut target, &json).unwrap();

        assert_eq!(report.version, DOCUMENT_VERSION);
        assert_eq!(report.buildings_loaded, 1);
        assert_eq!(report.objects_loaded, 2);
        assert_eq!(report.records_skipped, 0);

        let building = target.buildings().get(&bld).unwrap();
        assert_eq!(building.name.as_deref(), Some("Depot A"));
        assert_eq!(building.floor_levels(), vec![0, 1]);

        let restored = target.objects().get(&inside).unwrap();
        assert_eq!(restored.position, GridPosition::new(1, 1));
        assert_eq!(restored.orientation, Orientation::East);
        assert_eq!(restored.floor, 1);

        // Occupancy rebuilt from the records (East swaps the 2x1 footprint).
        assert_eq!(target.grid().cells_of(&inside).len(), 2);
        assert_eq!(target.camera(), Some(&json!({"yaw": 0.5, "distance": 40.0})));
    }

    #[test]
    fn import_replaces_state_and_clears_history() {
        let mut f = facade();
        f.place_object("unit", GridPosition::new(5, 5), Orientation::North, 0)
            .unwrap();

        let empty = export_document(&facade()).unwrap();
        let report = import_document(&mut f, &empty).unwrap();

        assert_eq!(report.objects_loaded, 0);
        assert!(f.objects().is_empty());
        assert!(f.grid().is_empty());
        assert!(!f.history().can_undo());
    }

    #[test]
    fn unknown_version_is_an_error() {
        let mut f = facade();
        let err = import_document(&mut f, r#"{"version": 7, "objects": []}"#).unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedVersion(7)));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let mut f = facade();
        assert!(matches!(
            import_document(&mut f, "not json"),
            Err(DocumentError::Parse(_))
        ));
    }

    #[test]
    fn malformed_and_unknown_asset_records_are_skipped() {
        let doc = json!({
            "version": 2,
            "objects": [
                {"id": "obj-0", "asset_id": "unit", "position": {"x": 0, "z": 0}},
                {"id": "obj-1", "asset_id": "no-such-asset", "position": {"x": 1, "z": 0}},
                {"id": "obj-2"},
            ],
        });

        let mut f = facade();
        let report = import_document(&mut f, &doc.to_string()).unwrap();
        assert_eq!(report.objects_loaded, 1);
        assert_eq!(report.records_skipped, 2);
        assert!(f.objects().contains("obj-0"));
        assert_eq!(f.objects().len(), 1);
    }

    #[test]
    fn legacy_document_loads_without_a_catalog() {
        // No version field; object records embed their asset metadata.
        let doc = json!({
            "buildings": [
                {
                    "id": "bld-0",
                    "footprints": [{"min_x": 0, "max_x": 2, "min_z": 0, "max_z": 2}],
                    "floors": [{"level": 0, "height": 3.0}],
                },
            ],
            "objects": [
                {
                    "id": "obj-0",
                    "asset_id": "legacy-shelf",
                    "position": {"x": 1, "z": 1},
                    "building_id": "bld-0",
                    "asset": {
                        "id": "legacy-shelf",
                        "name": "Shelf",
                        "category": "storage_unit",
                        "size": {"x": 1, "z": 1},
                    },
                },
            ],
        });

        let mut f = EditingFacade::new(EditorConfig::default(), AssetRegistry::new());
        let report = import_document(&mut f, &doc.to_string()).unwrap();

        assert_eq!(report.version, 1);
        assert_eq!(report.buildings_loaded, 1);
        assert_eq!(report.objects_loaded, 1);

        // The embedded metadata was registered, so the object stays editable.
        assert!(f.assets().contains("legacy-shelf"));
        assert!(f.move_object("obj-0", GridPosition::new(2, 2), Orientation::North));
    }

    #[test]
    fn imported_ids_do_not_collide_with_new_ones() {
        let doc = json!({
            "version": 2,
            "objects": [
                {"id": "obj-41", "asset_id": "unit", "position": {"x": 0, "z": 0}},
            ],
        });

        let mut f = facade();
        import_document(&mut f, &doc.to_string()).unwrap();
        let fresh = f
            .place_object("unit", GridPosition::new(5, 5), Orientation::North, 0)
            .unwrap();
        assert_eq!(fresh, "obj-42");
    }

    #[test]
    fn wall_attachments_survive_round_trip() {
        let mut source = facade();
        let bld = source.create_building(Footprint::new(0, 2, 0, 2), None);
        let door = source
            .place_object("door", GridPosition::new(1, 0), Orientation::North, 0)
            .unwrap();
        let wall_id = source
            .walls()
            .segments_of_building(&bld)
            .first()
            .map(|s| s.id.clone())
            .unwrap();
        assert!(source.attach_to_wall(&door, &wall_id, 0.25));

        let json = export_document(&source).unwrap();
        let mut target = facade();
        import_document(&mut target, &json).unwrap();

        // Regenerated wall ids are geometry-derived, so the exported
        // attachment binds to the same segment on the same floor.
        let attachment = target
            .objects()
            .get(&door)
            .unwrap()
            .wall_attachment
            .clone()
            .unwrap();
        assert_eq!(attachment.wall_id, wall_id);
        assert_eq!(target.walls().get(&wall_id).unwrap().floor, 0);
        assert_eq!(target.walls().openings_of(&wall_id), &[door.clone()]);
    }

    #[test]
    fn stale_wall_attachment_is_dropped() {
        let doc = json!({
            "version": 2,
            "objects": [
                {
                    "id": "obj-0",
                    "asset_id": "unit",
                    "position": {"x": 0, "z": 0},
                    "wall_attachment": {"wall_id": "wall-99", "position": 0.5},
                },
            ],
        });

        let mut f = facade();
        let report = import_document(&mut f, &doc.to_string()).unwrap();
        assert_eq!(report.objects_loaded, 1);
        assert!(f.objects().get("obj-0").unwrap().wall_attachment.is_none());
    }
}
