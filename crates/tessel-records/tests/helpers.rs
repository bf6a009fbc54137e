// Author: Tessel Developers
// Copyright © 2026, Tessel Developers, all rights reserved.
// Created: 16 October 2026

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use tessel_records::{Example, PipelineConfig, RecordWriter};

pub const IMAGE_SIZE: usize = 4;
pub const CLASSES: usize = 2;

pub fn example(idx: usize) -> Example {
    let pixels = IMAGE_SIZE * IMAGE_SIZE;
    Example::new(
        format!("image_{:03}.png", idx),
        (0..pixels * 3).map(|p| ((p + idx) % 256) as u8).collect(),
        (0..pixels * CLASSES).map(|p| ((p + idx) % 2) as u8).collect(),
    )
}

pub fn write_records(dir: &Path, count: usize) -> PathBuf {
    let path = dir.join("train.tsrc");
    let mut writer = RecordWriter::create_file(&path).unwrap();
    for idx in 0..count {
        writer.write(&example(idx)).unwrap();
    }
    writer.finish().unwrap();
    path
}

pub fn config(batch_size: usize, capacity: usize, epochs: Option<usize>) -> PipelineConfig {
    PipelineConfig {
        batch_size,
        image_size: IMAGE_SIZE,
        num_classes: CLASSES,
        capacity,
        threads: 2,
        epochs,
        seed: Some(42),
        ..Default::default()
    }
}
