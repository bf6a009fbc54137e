// Author: Tessel Developers
// Copyright © 2026, Tessel Developers, all rights reserved.
// Created: 16 October 2026

use candle::Device;
use tessel_core::prelude::*;

#[path = "./helpers.rs"]
mod helpers;

#[test]
fn test_checkpoint_roundtrip() {
    let config = helpers::small_config(2, 4);
    let (varmap, net) = helpers::build(&config);
    let input = helpers::ramp(1, 16, 16);
    let expected = net.logits_t(&input, false).unwrap().to_vec2::<f32>().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("unet.safetensors");
    save_checkpoint(&varmap, &path).unwrap();

    let restored = UNet::from_checkpoint(&path, &config, &Device::Cpu).unwrap();
    let actual = restored
        .logits_t(&input, false)
        .unwrap()
        .to_vec2::<f32>()
        .unwrap();

    assert_eq!(expected, actual);
}

#[test]
fn test_checkpoint_wrong_config() {
    let (varmap, _) = helpers::build(&helpers::small_config(2, 4));
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("unet.safetensors");
    save_checkpoint(&varmap, &path).unwrap();

    let result = UNet::from_checkpoint(&path, &helpers::small_config(4, 4), &Device::Cpu);
    assert!(matches!(result, Err(UNetError::Candle(_))));
}

#[test]
fn test_missing_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let result = UNet::from_checkpoint(
        dir.path().join("nope.safetensors"),
        &UNetConfig::default(),
        &Device::Cpu,
    );
    assert!(result.is_err());
}

#[test]
fn test_predictor_uses_first_slot() {
    let config = helpers::small_config(1, 3);
    let (varmap, net) = helpers::build(&config);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("unet.safetensors");
    save_checkpoint(&varmap, &path).unwrap();

    let image: Vec<u8> = (0..16 * 16 * 3).map(|idx| (idx % 251) as u8).collect();
    let normalized = tessel_core::normalize_pixels(&image);
    let single = candle::Tensor::from_vec(normalized, (1, 16, 16, 3), &Device::Cpu).unwrap();
    let expected = net
        .logits_t(&single, false)
        .unwrap()
        .flatten_all()
        .unwrap()
        .to_vec1::<f32>()
        .unwrap();

    let predictor = CheckpointPredictor::load(&path, &config, 4, (16, 16), Device::Cpu).unwrap();
    let actual = predictor.predict(&image).unwrap();

    assert_eq!(actual.len(), 16 * 16 * 3);
    for (a, b) in actual.iter().zip(&expected) {
        assert!((a - b).abs() < 1e-4, "{} vs {}", a, b);
    }
}

#[test]
fn test_predictor_rejects_wrong_length() {
    let config = helpers::small_config(1, 3);
    let (_, net) = helpers::build(&config);
    let predictor = CheckpointPredictor::new(net, 2, (16, 16), Device::Cpu).unwrap();

    assert!(matches!(
        predictor.predict(&[0; 10]),
        Err(UNetError::InputLength {
            expected: 768,
            actual: 10
        })
    ));
}
