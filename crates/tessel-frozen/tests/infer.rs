// Author: Tessel Developers
// Copyright © 2026, Tessel Developers, all rights reserved.
// Created: 16 October 2026

use tessel_frozen::tract_core::prelude::DatumType;
use tessel_frozen::{
    ArtifactKind, FrozenError, FrozenModel, InferenceDriver, TensorBinding, TensorRole,
};
use tessel_vis::{ColorMap, VisError, VOC};

#[path = "./helpers.rs"]
mod helpers;

#[test]
fn test_segment_voc_256() {
    let dir = tempfile::tempdir().unwrap();
    let model_dir = helpers::write_mean_scorer(dir.path(), "8", 256, 21);

    let driver = InferenceDriver::load(
        &model_dir,
        &helpers::binding(),
        8,
        (256, 256),
        ColorMap::Voc,
        21,
    )
    .unwrap();

    let image = driver.run(&helpers::half_black(300, 200)).unwrap();
    assert_eq!(image.dimensions(), (256, 256));

    let palette = &VOC[..21];
    assert!(image.pixels().all(|p| palette.contains(&p.0)));
    assert_eq!(image.get_pixel(0, 0).0, VOC[0]);
    assert_eq!(image.get_pixel(255, 255).0, VOC[20]);
}

#[test]
fn test_model_describes_io() {
    let dir = tempfile::tempdir().unwrap();
    let model_dir = helpers::write_mean_scorer(dir.path(), "2", 32, 4);

    let model = FrozenModel::load(&model_dir, &helpers::binding(), 2, (32, 32)).unwrap();
    assert_eq!(model.batch_size(), 2);
    assert_eq!(model.image_size(), (32, 32));

    let api = model.api();
    assert_eq!(api.inputs.len(), 1);
    assert_eq!(api.inputs[0].shape, vec![2, 32, 32, 3]);
    assert_eq!(api.outputs.len(), 1);
    assert_eq!(api.outputs[0].element_count(), 2 * 32 * 32 * 4);
}

#[test]
fn test_predict_batch_checks_length() {
    let dir = tempfile::tempdir().unwrap();
    let model_dir = helpers::write_mean_scorer(dir.path(), "2", 16, 3);
    let model = FrozenModel::load(&model_dir, &helpers::binding(), 2, (16, 16)).unwrap();

    assert!(matches!(
        model.predict_batch(&[0; 12]),
        Err(FrozenError::InputLength {
            expected: 1536,
            actual: 12
        })
    ));

    let scores = model.predict_batch(&vec![3; 2 * 16 * 16 * 3]).unwrap();
    assert_eq!(scores.len(), 2 * 16 * 16 * 3);
    assert_eq!(&scores[..3], &[0.0, 3.0, 6.0]);
}

#[test]
fn test_symbolic_batch() {
    let dir = tempfile::tempdir().unwrap();
    let model_dir = helpers::write_mean_scorer(dir.path(), "N", 16, 3);

    let model = FrozenModel::load(&model_dir, &helpers::binding(), 4, (16, 16)).unwrap();
    let scores = model.predict_batch(&vec![1; 4 * 16 * 16 * 3]).unwrap();
    assert_eq!(scores.len(), 4 * 16 * 16 * 3);
}

#[test]
fn test_missing_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let result = FrozenModel::load(
        dir.path().join("final_model"),
        &TensorBinding::default(),
        8,
        (256, 256),
    );

    assert!(matches!(result, Err(FrozenError::ArtifactNotFound(_))));
}

#[test]
fn test_unknown_tensor_name() {
    let dir = tempfile::tempdir().unwrap();
    let model_dir = helpers::write_mean_scorer(dir.path(), "2", 16, 3);

    let result = FrozenModel::load(&model_dir, &TensorBinding::default(), 2, (16, 16));
    match result {
        Err(FrozenError::TensorNotFound {
            role,
            name,
            available,
        }) => {
            assert_eq!(role, TensorRole::Input);
            assert_eq!(name, tessel_frozen::DEFAULT_INPUT);
            assert!(available.iter().any(|node| node == "input"));
        }
        other => panic!("unexpected result: {:?}", other.err()),
    }

    let result = FrozenModel::load(
        &model_dir,
        &TensorBinding::new("input", "predict/predict"),
        2,
        (16, 16),
    );
    assert!(matches!(
        result,
        Err(FrozenError::TensorNotFound {
            role: TensorRole::Output,
            ..
        })
    ));
}

#[test]
fn test_batch_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let model_dir = helpers::write_mean_scorer(dir.path(), "8", 16, 3);

    let result = FrozenModel::load(&model_dir, &helpers::binding(), 4, (16, 16));
    match result {
        Err(FrozenError::InputShapeMismatch { expected, actual }) => {
            assert_eq!(expected, vec![4, 16, 16, 3]);
            assert_eq!(actual, vec!["8", "16", "16", "3"]);
        }
        other => panic!("unexpected result: {:?}", other.err()),
    }
}

#[test]
fn test_class_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let model_dir = helpers::write_mean_scorer(dir.path(), "2", 16, 21);

    let driver = InferenceDriver::load(
        &model_dir,
        &helpers::binding(),
        2,
        (16, 16),
        ColorMap::Voc,
        10,
    )
    .unwrap();

    let result = driver.run(&helpers::half_black(16, 16));
    assert!(matches!(
        result,
        Err(FrozenError::OutputShapeMismatch {
            expected: 5120,
            actual: 10752
        })
    ));
}

#[test]
fn test_palette_checked_before_load() {
    let dir = tempfile::tempdir().unwrap();
    let result = InferenceDriver::load(
        dir.path().join("missing"),
        &helpers::binding(),
        2,
        (16, 16),
        ColorMap::Uavid,
        21,
    );

    assert!(matches!(
        result,
        Err(FrozenError::Vis(VisError::PaletteTooSmall {
            classes: 21,
            available: 8
        }))
    ));
}

#[test]
fn test_tensorflow_default_names() {
    let dir = tempfile::tempdir().unwrap();
    helpers::write_tf_passthrough(dir.path(), 16);

    let model = FrozenModel::load(dir.path(), &TensorBinding::default(), 2, (16, 16)).unwrap();
    assert_eq!(model.artifact().kind, ArtifactKind::TensorFlow);
    assert_eq!(model.input_type(), DatumType::U8);

    let api = model.api();
    assert_eq!(api.inputs[0].name, tessel_frozen::DEFAULT_INPUT);
    assert_eq!(api.inputs[0].shape, vec![2, 16, 16, 3]);
    assert_eq!(api.outputs[0].name, tessel_frozen::DEFAULT_OUTPUT);

    let pixel = [10u8, 20, 200];
    let batch = pixel.repeat(2 * 16 * 16);
    let scores = model.predict_batch(&batch).unwrap();
    assert_eq!(scores.len(), 2 * 16 * 16 * 3);
    assert_eq!(&scores[..3], &[10.0, 20.0, 200.0]);

    let driver = InferenceDriver::new(model, ColorMap::Voc, 3).unwrap();
    let labels = driver
        .predict_labels(&helpers::solid(40, 30, pixel))
        .unwrap();
    assert_eq!((labels.height, labels.width), (16, 16));
    assert!(labels.labels.iter().all(|label| *label == 2));

    let image = driver.run(&helpers::solid(40, 30, pixel)).unwrap();
    assert_eq!(image.dimensions(), (16, 16));
    assert_eq!(image.get_pixel(7, 3).0, VOC[2]);
}

#[test]
fn test_tensorflow_slot_suffix() {
    let dir = tempfile::tempdir().unwrap();
    let path = helpers::write_tf_passthrough(dir.path(), 16);

    let binding = TensorBinding::new(
        format!("{}:0", tessel_frozen::DEFAULT_INPUT),
        format!("{}:0", tessel_frozen::DEFAULT_OUTPUT),
    );
    let driver = InferenceDriver::load(&path, &binding, 2, (16, 16), ColorMap::Voc, 3).unwrap();
    assert_eq!(driver.model().api().outputs[0].name, tessel_frozen::DEFAULT_OUTPUT);

    let image = driver.run(&helpers::solid(16, 16, [200, 10, 20])).unwrap();
    assert!(image.pixels().all(|p| p.0 == VOC[1]));
}
