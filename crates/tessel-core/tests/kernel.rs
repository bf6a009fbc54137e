// Author: Tessel Developers
// Copyright © 2026, Tessel Developers, all rights reserved.
// Created: 16 October 2026

use candle::Device;
use tessel_core::kernel::{bilinear_upsample_weights, kernel_size};

fn is_close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-5
}

#[test]
fn test_kernel_sizes() {
    assert_eq!(kernel_size(2), 4);
    assert_eq!(kernel_size(3), 5);
}

#[test]
fn test_deterministic() {
    assert_eq!(
        bilinear_upsample_weights(2, 3).unwrap(),
        bilinear_upsample_weights(2, 3).unwrap()
    );
}

#[test]
fn test_slice_sums() {
    for factor in 1..=4 {
        let kernel = bilinear_upsample_weights(factor, 2).unwrap();
        let phases = (factor * factor) as f32;

        for channel in 0..2 {
            let slice = kernel.channel_slice(channel);
            let sum: f32 = slice.iter().sum();
            assert!(is_close(sum / phases, 1.0), "factor {}: {}", factor, sum);
        }
    }
}

#[test]
fn test_stride_phases_sum_to_one() {
    for factor in [2, 3, 4] {
        let kernel = bilinear_upsample_weights(factor, 1).unwrap();
        let size = kernel.size();

        for row_phase in 0..factor {
            for col_phase in 0..factor {
                let mut sum = 0.0;
                for row in (row_phase..size).step_by(factor) {
                    for col in (col_phase..size).step_by(factor) {
                        sum += kernel.at(row, col, 0, 0);
                    }
                }
                assert!(
                    is_close(sum, 1.0),
                    "factor {} phase ({}, {}): {}",
                    factor,
                    row_phase,
                    col_phase,
                    sum
                );
            }
        }
    }
}

#[test]
fn test_off_diagonal_is_zero() {
    let kernel = bilinear_upsample_weights(2, 3).unwrap();
    for row in 0..kernel.size() {
        for col in 0..kernel.size() {
            for input in 0..3 {
                for output in 0..3 {
                    if input != output {
                        assert_eq!(kernel.at(row, col, input, output), 0.0);
                    }
                }
            }
        }
    }
}

#[test]
fn test_tensor_layout() {
    let kernel = bilinear_upsample_weights(2, 3).unwrap();
    let tensor = kernel.to_tensor(&Device::Cpu).unwrap();
    assert_eq!(tensor.dims(), &[3, 3, 4, 4]);

    let diagonal = tensor
        .narrow(0, 1, 1)
        .unwrap()
        .narrow(1, 1, 1)
        .unwrap()
        .flatten_all()
        .unwrap()
        .to_vec1::<f32>()
        .unwrap();
    assert_eq!(diagonal, kernel.channel_slice(1));
}
