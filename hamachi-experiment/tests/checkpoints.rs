//! Behavioural tests for checkpoint persistence.

use hamachi_experiment::{
    Checkpoint, ExperimentErrorCode, ParamTensor, StateDict, init_pipeline, list_checkpoints,
    load_ckpt, save_ckpt,
};
use hamachi_test_support::tracing::RecordingLayer;
use rstest::{fixture, rstest};
use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;

#[fixture]
fn scratch() -> TempDir {
    tempfile::tempdir().expect("create temp dir")
}

struct Linear {
    weight: Vec<f32>,
    bias: f32,
}

impl Checkpoint for Linear {
    fn state_dict(&self) -> StateDict {
        let weight = ParamTensor::new(vec![1, self.weight.len()], self.weight.clone())
            .expect("row vector matches its length");
        StateDict::new()
            .with("linear.weight", weight)
            .with("linear.bias", ParamTensor::scalar(self.bias))
    }
}

#[rstest]
fn checkpoints_are_named_by_epoch(scratch: TempDir) {
    let model_dir = scratch.path().join("run");
    init_pipeline(&model_dir).expect("init succeeds");
    let net = Linear {
        weight: vec![0.5, -1.0, 2.0],
        bias: 0.25,
    };

    save_ckpt(&model_dir, &net, 0).expect("epoch 0 saved");
    save_ckpt(&model_dir, &net, 10).expect("epoch 10 saved");
    save_ckpt(&model_dir, &net, 2).expect("epoch 2 saved");

    assert!(model_dir.join("checkpoints/model-epoch10.pt").is_file());
    assert_eq!(list_checkpoints(&model_dir).expect("listing works"), [0, 2, 10]);

    let loaded = load_ckpt(&model_dir, 10).expect("checkpoint loads");
    assert_eq!(loaded, net.state_dict());
    let weight = loaded.get("linear.weight").expect("weight stored");
    assert_eq!(weight.shape(), [1, 3]);
    assert_eq!(weight.values(), [0.5, -1.0, 2.0]);
}

#[rstest]
fn saving_same_epoch_overwrites(scratch: TempDir) {
    let model_dir = scratch.path().join("run");
    let experiment = init_pipeline(&model_dir).expect("init succeeds");

    experiment
        .save_ckpt(&StateDict::new().with("w", ParamTensor::scalar(1.0)), 4)
        .expect("first save");
    let replacement = StateDict::new().with("w", ParamTensor::scalar(2.0));
    experiment.save_ckpt(&replacement, 4).expect("second save");

    assert_eq!(experiment.load_ckpt(4).expect("checkpoint loads"), replacement);
    assert_eq!(experiment.list_checkpoints().expect("listing works"), [4]);
}

#[rstest]
fn diverged_parameters_survive_a_round_trip(scratch: TempDir) {
    let model_dir = scratch.path().join("run");
    init_pipeline(&model_dir).expect("init succeeds");
    let net = Linear {
        weight: vec![f32::NAN, f32::INFINITY, -1.5],
        bias: f32::NEG_INFINITY,
    };

    save_ckpt(&model_dir, &net, 5).expect("diverged checkpoint saved");
    let loaded = load_ckpt(&model_dir, 5).expect("diverged checkpoint loads");

    let weight = loaded.get("linear.weight").expect("weight stored");
    assert_eq!(weight.shape(), [1, 3]);
    assert!(weight.values().first().is_some_and(|value| value.is_nan()));
    assert_eq!(weight.values().get(1..), Some([f32::INFINITY, -1.5].as_slice()));
    let bias = loaded.get("linear.bias").expect("bias stored");
    assert_eq!(bias.values(), [f32::NEG_INFINITY]);
}

#[rstest]
fn unrelated_files_are_not_listed(scratch: TempDir) {
    let model_dir = scratch.path().join("run");
    init_pipeline(&model_dir).expect("init succeeds");
    std::fs::write(model_dir.join("checkpoints/notes.txt"), "hi").expect("write fixture");
    std::fs::write(model_dir.join("checkpoints/model-epochX.pt"), "{}").expect("write fixture");

    assert!(list_checkpoints(&model_dir).expect("listing works").is_empty());
}

#[rstest]
fn missing_checkpoint_reports_io(scratch: TempDir) {
    let model_dir = scratch.path().join("run");
    init_pipeline(&model_dir).expect("init succeeds");
    let err = load_ckpt(&model_dir, 1).expect_err("nothing saved");
    assert_eq!(err.code(), ExperimentErrorCode::Io);
}

#[rstest]
fn corrupt_checkpoint_reports_json(scratch: TempDir) {
    let model_dir = scratch.path().join("run");
    init_pipeline(&model_dir).expect("init succeeds");
    std::fs::write(
        model_dir.join("checkpoints/model-epoch1.pt"),
        r#"{"w":{"shape":[3],"values":[1.0]}}"#,
    )
    .expect("write fixture");

    let err = load_ckpt(&model_dir, 1).expect_err("tensor is inconsistent");
    assert_eq!(err.code(), ExperimentErrorCode::Json);
}

#[rstest]
fn saving_without_init_fails(scratch: TempDir) {
    let net = StateDict::new();
    let err = save_ckpt(scratch.path().join("absent"), &net, 0).expect_err("no directory");
    assert_eq!(err.code(), ExperimentErrorCode::MissingDirectory);
}

#[rstest]
fn save_emits_summary_event(scratch: TempDir) {
    let model_dir = scratch.path().join("run");
    init_pipeline(&model_dir).expect("init succeeds");
    let layer = RecordingLayer::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());
    let net = Linear {
        weight: vec![1.0, 2.0],
        bias: 0.0,
    };

    tracing::subscriber::with_default(subscriber, || save_ckpt(&model_dir, &net, 7))
        .expect("checkpoint saved");

    let span = layer
        .span_named("experiment.save_ckpt")
        .expect("experiment.save_ckpt span must exist");
    assert_eq!(span.field("epoch"), Some("7"));
    let event = layer
        .events()
        .into_iter()
        .find(|event| event.level == Level::INFO)
        .expect("info event emitted");
    assert_eq!(event.field("message"), Some("checkpoint saved"));
    assert_eq!(event.field("tensors"), Some("2"));
    assert_eq!(event.field("parameters"), Some("3"));
}
