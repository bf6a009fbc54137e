// Author: Tessel Developers
// Copyright © 2026, Tessel Developers, all rights reserved.
// Created: 16 October 2026

use candle::{DType, Device, Tensor};
use tessel_core::prelude::*;

#[path = "./helpers.rs"]
mod helpers;

#[test]
fn test_logits_shape() {
    for (filters, classes) in [(1, 21), (2, 5), (4, 8)] {
        let (_, net) = helpers::build(&helpers::small_config(filters, classes));
        let logits = net.forward_t(&helpers::ramp(2, 32, 16), false).unwrap();
        assert_eq!(logits.logits().dims(), &[2 * 32 * 16, classes]);
    }
}

#[test]
fn test_single_class() {
    let (_, net) = helpers::build(&helpers::small_config(2, 1));
    let logits = net.forward_t(&helpers::ramp(1, 16, 16), false).unwrap();
    assert_eq!(logits.logits().dims(), &[16 * 16, 1]);
}

#[test]
fn test_concats_match_spatially() {
    let (_, net) = helpers::build(&helpers::small_config(1, 3));

    for (height, width) in [(16, 16), (32, 48), (64, 16)] {
        let activations = net
            .forward_t(&helpers::ramp(1, height, width), false)
            .unwrap();

        for (stage, scale) in Stage::CONCATS.iter().zip([8, 4, 2, 1]) {
            let (_, _, h, w) = activations.get(*stage).unwrap().dims4().unwrap();
            assert_eq!((h, w), (height / scale, width / scale), "{}", stage);
        }
    }
}

#[test]
fn test_concat_channels() {
    let f = 2;
    let (_, net) = helpers::build(&helpers::small_config(f, 3));
    let activations = net.forward_t(&helpers::ramp(1, 16, 16), false).unwrap();

    for (stage, channels) in Stage::CONCATS.iter().zip([24 * f, 12 * f, 6 * f, 3 * f]) {
        assert_eq!(activations.get(*stage).unwrap().dim(1).unwrap(), channels);
    }
}

#[test]
fn test_records_every_stage() {
    let (_, net) = helpers::build(&helpers::small_config(1, 2));
    let activations = net.forward_t(&helpers::ramp(1, 16, 16), false).unwrap();

    assert_eq!(activations.len(), Stage::ALL.len());
    for stage in Stage::ALL {
        assert!(activations.get(*stage).is_some(), "missing {}", stage);
    }
}

#[test]
fn test_upsample_variants_agree_on_shape() {
    for upsample in [Upsample::Deconv, Upsample::Bilinear, Upsample::Nearest] {
        let config = UNetConfig {
            upsample,
            ..helpers::small_config(2, 4)
        };
        let (_, net) = helpers::build(&config);
        let activations = net.forward_t(&helpers::ramp(2, 16, 32), false).unwrap();

        assert_eq!(activations.logits().dims(), &[2 * 16 * 32, 4], "{}", upsample);
        let (_, c, h, w) = activations.get(Stage::Upsample6).unwrap().dims4().unwrap();
        assert_eq!((c, h, w), (32, 2, 4), "{}", upsample);
    }
}

#[test]
fn test_bilinear_has_no_upsample_parameters() {
    let config = UNetConfig {
        upsample: Upsample::Bilinear,
        ..helpers::small_config(1, 2)
    };
    let (varmap, _) = helpers::build(&config);
    let data = varmap.data().lock().unwrap();

    assert!(data.keys().all(|key| !key.starts_with("upsample")));
    assert!(data.keys().any(|key| key.starts_with("conv10")));
}

#[test]
fn test_rejects_indivisible_input() {
    let (_, net) = helpers::build(&helpers::small_config(1, 2));
    let result = net.forward_t(&helpers::ramp(1, 24, 16), false);

    assert!(matches!(
        result,
        Err(UNetError::IndivisibleInput { ref shape, .. }) if shape == &[1, 24, 16, 3]
    ));
}

#[test]
fn test_rejects_wrong_channel_count() {
    let (_, net) = helpers::build(&helpers::small_config(1, 2));
    let input = Tensor::zeros((1, 16, 16, 4), DType::F32, &Device::Cpu).unwrap();

    assert!(matches!(
        net.forward_t(&input, false),
        Err(UNetError::ChannelMismatch {
            stage: Stage::Conv1_1,
            expected: 3,
            actual: 4,
        })
    ));
}

#[test]
fn test_rejects_invalid_config() {
    let varmap = candle_nn::VarMap::new();
    let vb = candle_nn::VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);

    assert!(matches!(
        UNet::new(&helpers::small_config(0, 2), vb),
        Err(UNetError::InvalidConfig(_))
    ));
}

#[test]
fn test_inference_is_deterministic() {
    let (_, net) = helpers::build(&helpers::small_config(2, 3));
    let input = helpers::ramp(1, 16, 16);

    let first = net.logits_t(&input, false).unwrap().to_vec2::<f32>().unwrap();
    let second = net.logits_t(&input, false).unwrap().to_vec2::<f32>().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_training_mode_runs() {
    let config = UNetConfig {
        keep_prob: 0.5,
        ..helpers::small_config(1, 3)
    };
    let (_, net) = helpers::build(&config);
    let logits = net.logits_t(&helpers::ramp(2, 16, 16), true).unwrap();

    assert_eq!(logits.dims(), &[2 * 16 * 16, 3]);
}
