//! Behavioural tests for JSON parameter persistence.

use std::{collections::BTreeMap, fs};

use hamachi_experiment::{
    ExperimentError, ExperimentErrorCode, init_pipeline, load_params, load_params_as, save_params,
};
use hamachi_test_support::ci::suite_proptest_config;
use proptest::prelude::*;
use rstest::{fixture, rstest};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tempfile::TempDir;

#[fixture]
fn scratch() -> TempDir {
    tempfile::tempdir().expect("create temp dir")
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct TrainingParams {
    lr: f64,
    epochs: u32,
    arch: String,
    eps: Option<f64>,
}

#[rstest]
fn params_are_sorted_and_indented(scratch: TempDir) {
    let params = json!({
        "zeta": 1,
        "alpha": {"inner_b": true, "inner_a": [1, 2]},
        "mid": "text",
    });
    save_params(scratch.path(), &params).expect("params saved");

    let text = fs::read_to_string(scratch.path().join("params.json")).expect("file written");
    let expected = concat!(
        "{\n",
        "  \"alpha\": {\n",
        "    \"inner_a\": [\n",
        "      1,\n",
        "      2\n",
        "    ],\n",
        "    \"inner_b\": true\n",
        "  },\n",
        "  \"mid\": \"text\",\n",
        "  \"zeta\": 1\n",
        "}",
    );
    assert_eq!(text, expected);
}

#[rstest]
fn saving_replaces_previous_params(scratch: TempDir) {
    save_params(scratch.path(), &json!({"lr": 0.1, "epochs": 5})).expect("first save");
    save_params(scratch.path(), &json!({"lr": 0.01})).expect("second save");

    let loaded = load_params(scratch.path()).expect("params load");
    assert_eq!(Value::Object(loaded), json!({"lr": 0.01}));
}

#[rstest]
fn typed_params_round_trip(scratch: TempDir) {
    let model_dir = scratch.path().join("run");
    let experiment = init_pipeline(&model_dir).expect("init succeeds");
    let params = TrainingParams {
        lr: 0.001,
        epochs: 500,
        arch: String::from("resnet18"),
        eps: None,
    };
    experiment.save_params(&params).expect("params saved");

    let loaded: TrainingParams = load_params_as(&model_dir).expect("params decode");
    assert_eq!(loaded, params);
    let raw = load_params(&model_dir).expect("params load");
    assert_eq!(raw.get("eps"), Some(&Value::Null));
    assert_eq!(
        raw.keys().map(String::as_str).collect::<Vec<_>>(),
        ["arch", "eps", "epochs", "lr"]
    );
}

#[rstest]
#[case::tiny(1.071_566_039_146_582_6e-75)]
#[case::negative_tiny(-1.819_967_304_027_17e-179)]
#[case::huge(-1.603_964_615_428_183e143)]
#[case::third(1.0 / 3.0)]
fn floats_survive_a_round_trip_bit_for_bit(scratch: TempDir, #[case] value: f64) {
    save_params(scratch.path(), &json!({ "v": value })).expect("params saved");
    let loaded = load_params(scratch.path()).expect("params load");
    let read_back = loaded.get("v").and_then(Value::as_f64).expect("float stored");
    assert_eq!(read_back.to_bits(), value.to_bits());
}

#[rstest]
#[case::array(json!([1, 2, 3]))]
#[case::number(json!(4))]
#[case::null(Value::Null)]
fn non_object_params_are_rejected(scratch: TempDir, #[case] params: Value) {
    let err = save_params(scratch.path(), &params).expect_err("not an object");
    assert_eq!(err.code(), ExperimentErrorCode::ParamsNotObject);
    assert!(!scratch.path().join("params.json").exists());
}

#[rstest]
fn loading_non_object_file_is_rejected(scratch: TempDir) {
    fs::write(scratch.path().join("params.json"), "[1, 2]").expect("write fixture");
    let err = load_params(scratch.path()).expect_err("array is not a params object");
    assert!(matches!(err, ExperimentError::ParamsNotObject { .. }));
}

#[rstest]
fn loading_missing_file_reports_io(scratch: TempDir) {
    let err = load_params(scratch.path()).expect_err("no params file");
    assert_eq!(err.code(), ExperimentErrorCode::Io);
}

#[rstest]
fn saving_into_missing_directory_fails(scratch: TempDir) {
    let err = save_params(scratch.path().join("absent"), &json!({})).expect_err("no directory");
    assert_eq!(err.code(), ExperimentErrorCode::MissingDirectory);
}

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<f64>()
            .prop_filter("JSON numbers are finite", |value| value.is_finite())
            .prop_map(Value::from),
        "[a-z0-9 ]{0,12}".prop_map(Value::from),
    ]
}

proptest! {
    #![proptest_config(suite_proptest_config(64))]

    #[test]
    fn arbitrary_maps_round_trip(
        entries in prop::collection::btree_map("[a-z_]{1,8}", scalar(), 0..8),
    ) {
        let scratch = tempfile::tempdir().expect("create temp dir");
        save_params(scratch.path(), &entries)?;
        let loaded = load_params(scratch.path())?;
        let loaded: BTreeMap<String, Value> = loaded.into_iter().collect();
        prop_assert_eq!(loaded, entries);
    }
}
