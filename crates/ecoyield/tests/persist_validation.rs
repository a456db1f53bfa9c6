//! Corrupt-artifact tests: mutate a known-good fixture and expect a typed error.

use std::io::Cursor;

use ecoyield::persist::{self, ReadError};
use serde_json::Value;

fn fixture_path(name: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/test-cases/artifacts/v1")
        .join(name)
}

fn load_fixture_value(name: &str) -> Value {
    let bytes = std::fs::read(fixture_path(name)).expect("read fixture");
    serde_json::from_slice(&bytes).expect("parse fixture json")
}

fn model_err(v: Value) -> ReadError {
    let bytes = serde_json::to_vec(&v).expect("serialize mutated json");
    persist::read_model_json(Cursor::new(&bytes)).expect_err("expected error")
}

fn codec_err(v: Value) -> ReadError {
    let bytes = serde_json::to_vec(&v).expect("serialize mutated json");
    persist::read_codec_json(Cursor::new(&bytes)).expect_err("expected error")
}

fn tree_array<'a>(v: &'a mut Value, tree: usize, field: &str) -> &'a mut Vec<Value> {
    v.pointer_mut(&format!("/model/forest/trees/{tree}/{field}"))
        .and_then(|x| x.as_array_mut())
        .expect("tree array")
}

#[test]
fn fixtures_load_and_match_reference() {
    let model = persist::load_model(fixture_path("yield_model.json")).unwrap();
    let codec = persist::load_codec(fixture_path("crop_codec.json")).unwrap();

    assert_eq!(model.forest().n_trees(), 3);
    assert_eq!(model.n_features(), 8);
    assert_eq!(codec, ecoyield::testing::reference_codec());

    let reference = ecoyield::testing::reference_model();
    for row in [
        [80.0f32, 40.0, 40.0, 25.0, 70.0, 6.5, 200.0, 20.0],
        [40.0, 20.0, 20.0, 25.0, 70.0, 6.5, 300.0, 11.0],
        [40.0, 20.0, 20.0, 25.0, 70.0, 6.5, 100.0, 0.0],
        [f32::NAN, 0.0, 0.0, 0.0, 0.0, 0.0, f32::NAN, f32::NAN],
    ] {
        assert_eq!(model.predict_row(&row), reference.predict_row(&row));
    }
}

#[test]
fn validation_fails_on_mismatched_array_lengths() {
    let mut v = load_fixture_value("yield_model.json");
    tree_array(&mut v, 0, "thresholds").pop();

    let err = model_err(v);
    assert!(matches!(err, ReadError::Validation(_)), "got: {err:?}");
}

#[test]
fn validation_fails_on_out_of_bounds_child_index() {
    let mut v = load_fixture_value("yield_model.json");
    tree_array(&mut v, 0, "children_left")[0] = Value::from(9_999_999u64);

    let err = model_err(v);
    match err {
        ReadError::Validation(msg) => assert!(msg.starts_with("tree 0:"), "{msg}"),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn validation_fails_on_cycle() {
    let mut v = load_fixture_value("yield_model.json");
    // Node 2 of the rainfall tree points back at itself.
    tree_array(&mut v, 1, "children_left")[2] = Value::from(2u64);

    let err = model_err(v);
    assert!(matches!(err, ReadError::Validation(_)), "got: {err:?}");
}

#[test]
fn validation_fails_on_unreachable_node() {
    let mut v = load_fixture_value("yield_model.json");
    // Turn node 2 into a leaf; nodes 3 and 4 become orphans.
    tree_array(&mut v, 1, "children_left")[2] = Value::from(0u64);
    tree_array(&mut v, 1, "children_right")[2] = Value::from(0u64);

    let err = model_err(v);
    assert!(matches!(err, ReadError::Validation(_)), "got: {err:?}");
}

#[test]
fn validation_fails_on_split_feature_out_of_range() {
    let mut v = load_fixture_value("yield_model.json");
    tree_array(&mut v, 2, "split_indices")[0] = Value::from(8u64);

    let err = model_err(v);
    assert!(matches!(err, ReadError::Validation(_)), "got: {err:?}");
}

#[test]
fn validation_fails_on_empty_forest() {
    let mut v = load_fixture_value("yield_model.json");
    v["model"]["forest"]["trees"] = Value::Array(Vec::new());

    let err = model_err(v);
    assert!(matches!(err, ReadError::Validation(_)), "got: {err:?}");
}

#[test]
fn validation_fails_on_feature_name_count() {
    let mut v = load_fixture_value("yield_model.json");
    v.pointer_mut("/model/meta/feature_names")
        .and_then(|x| x.as_array_mut())
        .expect("feature names")
        .pop();

    let err = model_err(v);
    assert!(matches!(err, ReadError::Validation(_)), "got: {err:?}");
}

#[test]
fn rejects_future_format_version() {
    let mut v = load_fixture_value("yield_model.json");
    v["format_version"] = Value::from(2u64);

    let err = model_err(v);
    assert!(
        matches!(err, ReadError::UnsupportedVersion { found: 2, supported: 1 }),
        "got: {err:?}"
    );
}

#[test]
fn rejects_unknown_model_type() {
    let mut v = load_fixture_value("yield_model.json");
    v["model_type"] = Value::from("linear");

    let err = model_err(v);
    assert!(matches!(err, ReadError::UnexpectedModelType(ref t) if t == "linear"), "got: {err:?}");
}

#[test]
fn rejects_missing_required_field() {
    let mut v = load_fixture_value("yield_model.json");
    v.pointer_mut("/model/forest/trees/0")
        .and_then(|x| x.as_object_mut())
        .expect("tree object")
        .remove("leaf_values");

    let err = model_err(v);
    assert!(matches!(err, ReadError::Json(_)), "got: {err:?}");
}

#[test]
fn codec_rejects_duplicates_and_empty_vocabulary() {
    let mut v = load_fixture_value("crop_codec.json");
    v["classes"]
        .as_array_mut()
        .expect("classes")
        .push(Value::from("rice"));
    assert!(matches!(codec_err(v), ReadError::Validation(_)));

    let mut v = load_fixture_value("crop_codec.json");
    v["classes"] = Value::Array(Vec::new());
    assert!(matches!(codec_err(v), ReadError::Validation(_)));

    let mut v = load_fixture_value("crop_codec.json");
    v["classes"][3] = Value::from("");
    assert!(matches!(codec_err(v), ReadError::Validation(_)));
}

#[test]
fn less_or_equal_export_sends_threshold_values_left() {
    let row = [60.0f32, 20.0, 20.0, 25.0, 70.0, 6.5, 150.0, 0.0];

    let v = load_fixture_value("yield_model.json");
    let bytes = serde_json::to_vec(&v).unwrap();
    let default_rule = persist::read_model_json(Cursor::new(&bytes)).unwrap();
    // N = 60 and rainfall = 150 sit on their thresholds and go right.
    assert_eq!(default_rule.predict_row(&row), 7.0 + 4.0 + 0.5);

    let mut v = load_fixture_value("yield_model.json");
    v["model"]["forest"]["split_rule"] = Value::from("less_or_equal");
    v["model"]["forest"]["aggregation"] = Value::from("mean");
    let bytes = serde_json::to_vec(&v).unwrap();
    let sklearn = persist::read_model_json(Cursor::new(&bytes)).unwrap();
    assert_eq!(sklearn.predict_row(&row), (5.0 + 2.0 + 0.5) / 3.0);
}

#[test]
fn rejects_unknown_split_rule() {
    let mut v = load_fixture_value("yield_model.json");
    v["model"]["forest"]["split_rule"] = Value::from("greater_than");

    let err = model_err(v);
    assert!(matches!(err, ReadError::Json(_)), "got: {err:?}");
}
