// Author: Tessel Developers
// Copyright © 2026, Tessel Developers, all rights reserved.
// Created: 16 October 2026

#![allow(dead_code)]

use candle::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use tessel_core::{UNet, UNetConfig};

pub fn small_config(filters: usize, num_classes: usize) -> UNetConfig {
    UNetConfig {
        filters,
        num_classes,
        ..Default::default()
    }
}

pub fn build(config: &UNetConfig) -> (VarMap, UNet) {
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
    let net = UNet::new(config, vb).unwrap();
    (varmap, net)
}

/// A deterministic, non-constant NHWC batch.
pub fn ramp(batch: usize, height: usize, width: usize) -> Tensor {
    let count = batch * height * width * 3;
    let data: Vec<f32> = (0..count).map(|idx| (idx % 97) as f32 / 97.0 - 0.5).collect();
    Tensor::from_vec(data, (batch, height, width, 3), &Device::Cpu).unwrap()
}
