mod common;

use csv_reconcile::{
    FieldMapping, MappingPair, ReconcileError,
    mapping::{MappingOrigin, import_mapping, load_mapping, resolve_mapping, save_mapping},
};
use proptest::prelude::*;

use common::{TestWorkspace, columns};

fn primary_columns() -> Vec<String> {
    columns(&["id", "Ho va ten", "city", "phone"])
}

fn secondary_columns() -> Vec<String> {
    columns(&["id", "ho ten", "city", "email"])
}

fn key_columns() -> Vec<String> {
    columns(&["id"])
}

#[test]
fn import_object_payload_counts_dropped_pairs() {
    let import = import_mapping(
        r#"{"Ho va ten": "ho ten", "phone": "mobile", "id": "city"}"#,
        &primary_columns(),
        &secondary_columns(),
        &key_columns(),
    )
    .expect("import");
    assert!(import.is_success());
    assert_eq!(import.accepted(), 1);
    assert_eq!(import.dropped, 2);
    assert_eq!(
        import.mapping.pairs(),
        &[MappingPair::new("Ho va ten", "ho ten")]
    );
}

#[test]
fn import_list_payload_counts_malformed_entries() {
    let import = import_mapping(
        r#"[{"dest": "city", "src": "city"}, {"src": "email"}, "phone"]"#,
        &primary_columns(),
        &secondary_columns(),
        &key_columns(),
    )
    .expect("import");
    assert_eq!(import.accepted(), 1);
    assert_eq!(import.dropped, 2);
}

#[test]
fn import_with_no_valid_pairs_reports_failure() {
    let import = import_mapping(
        r#"{"ghost": "city"}"#,
        &primary_columns(),
        &secondary_columns(),
        &key_columns(),
    )
    .expect("import");
    assert!(!import.is_success());
    assert_eq!(import.dropped, 1);
}

#[test]
fn import_rejects_other_shapes() {
    let err = import_mapping(
        "[1, 2] extra",
        &primary_columns(),
        &secondary_columns(),
        &key_columns(),
    )
    .unwrap_err();
    assert!(matches!(err, ReconcileError::Format(_)));

    let err = import_mapping(
        "true",
        &primary_columns(),
        &secondary_columns(),
        &key_columns(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("found a boolean"));
}

#[test]
fn export_uses_canonical_list_form() {
    let mapping = resolve_mapping(
        None,
        &primary_columns(),
        &secondary_columns(),
        &key_columns(),
    );
    assert_eq!(mapping.origin(), MappingOrigin::Default);
    let json: serde_json::Value = serde_json::from_str(&mapping.to_json().unwrap()).unwrap();
    assert_eq!(json, serde_json::json!([{"dest": "city", "src": "city"}]));
}

#[test]
fn export_then_import_round_trips() {
    let explicit = FieldMapping::from_pairs([
        ("phone", "email"),
        ("Ho va ten", "ho ten"),
        ("city", "city"),
        ("id", "city"),
    ]);
    let resolved = resolve_mapping(
        Some(&explicit),
        &primary_columns(),
        &secondary_columns(),
        &key_columns(),
    );
    let exported = resolved.to_json().unwrap();
    let reimported = import_mapping(
        &exported,
        &primary_columns(),
        &secondary_columns(),
        &key_columns(),
    )
    .unwrap();
    assert_eq!(reimported.mapping.pairs(), resolved.pairs());
    assert_eq!(reimported.dropped, 0);
    assert_eq!(reimported.mapping.to_json().unwrap(), exported);
}

#[test]
fn mapping_files_round_trip() {
    let workspace = TestWorkspace::new();
    let resolved = resolve_mapping(
        Some(&FieldMapping::from_pairs([("Ho va ten", "ho ten")])),
        &primary_columns(),
        &secondary_columns(),
        &key_columns(),
    );
    let path = workspace.path().join("mapping.json");
    save_mapping(&path, &resolved).expect("save mapping");
    let loaded = load_mapping(&path).expect("load mapping");
    assert_eq!(loaded.mapping, resolved.to_field_mapping());
    assert_eq!(loaded.malformed, 0);
}

proptest! {
    #[test]
    fn export_of_import_is_the_valid_subset(
        picks in proptest::collection::vec((0usize..5, 0usize..5), 0..8)
    ) {
        let dests = ["id", "Ho va ten", "city", "phone", "ghost"];
        let srcs = ["id", "ho ten", "city", "email", "ghost"];
        let pairs = picks
            .iter()
            .map(|(d, s)| MappingPair::new(dests[*d], srcs[*s]))
            .collect::<Vec<_>>();
        let payload = serde_json::to_string(&pairs).unwrap();
        let import = import_mapping(&payload, &primary_columns(), &secondary_columns(), &key_columns())
            .unwrap();

        for pair in import.mapping.pairs() {
            prop_assert!(pair.dest != "id" && pair.dest != "ghost");
            prop_assert!(pair.src != "id" && pair.src != "ghost");
            prop_assert!(pairs.contains(pair));
        }
        let again = import_mapping(
            &import.mapping.to_json().unwrap(),
            &primary_columns(),
            &secondary_columns(),
            &key_columns(),
        )
        .unwrap();
        prop_assert_eq!(again.mapping.pairs(), import.mapping.pairs());
    }
}
