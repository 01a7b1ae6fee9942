//! Tests for model registry decoding and project filtering

use survey_common::{ModelId, ModelRecord, ModelRegistry};

fn listing() -> Vec<ModelRecord> {
    serde_json::from_str(
        r#"[
            {"id": 1, "name": "ASAS", "project_id": 4},
            {"id": "kepler-v2", "name": "Kepler", "project_id": 4},
            {"id": 7, "name": "ASAS", "project_id": 5}
        ]"#,
    )
    .unwrap()
}

#[test]
fn test_records_accept_integer_and_string_ids() {
    let records = listing();
    assert_eq!(records[0].id, ModelId::Int(1));
    assert_eq!(records[1].id, ModelId::Text("kepler-v2".to_string()));
}

#[test]
fn test_project_filter_isolates_same_named_models() {
    let project_4 = ModelRegistry::for_project(listing(), 4).unwrap();
    let project_5 = ModelRegistry::for_project(listing(), 5).unwrap();

    assert_eq!(project_4.name_to_id()["ASAS"], ModelId::Int(1));
    assert_eq!(project_5.name_to_id()["ASAS"], ModelId::Int(7));
    assert_eq!(project_5.len(), 1);
}

#[test]
fn test_unfiltered_registry_keeps_all_records() {
    let registry = ModelRegistry::from_records(listing()).unwrap();

    assert_eq!(registry.project_id(), None);
    assert_eq!(registry.len(), 3);
    // Later record wins for the shared name
    assert_eq!(registry.name_to_id()["ASAS"], ModelId::Int(7));
    assert_eq!(registry.id_to_name().len(), 3);
}

#[test]
fn test_unknown_project_is_empty_not_error() {
    let registry = ModelRegistry::for_project(listing(), 99).unwrap();

    assert!(registry.is_empty());
    assert!(registry.name_to_id().is_empty());
}

#[test]
fn test_record_serializes_id_untagged() {
    let json = serde_json::to_string(&listing()[1]).unwrap();
    assert_eq!(json, r#"{"id":"kepler-v2","name":"Kepler","project_id":4}"#);
}
