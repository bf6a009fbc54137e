// Author: Tessel Developers
// Copyright © 2026, Tessel Developers, all rights reserved.
// Created: 16 October 2026

#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// Writes an NNEF graph that scores class `c` of each pixel as
/// `c * mean(r, g, b)`, flattened to `(-1, classes)`.
///
/// Black pixels therefore tie on every class and decode to label 0, every
/// other pixel decodes to the last class.
pub fn write_mean_scorer(dir: &Path, batch: &str, size: usize, classes: usize) -> PathBuf {
    let weights = (0..classes)
        .map(|c| format!("{:.1}", c as f32))
        .collect::<Vec<_>>()
        .join(", ");

    let extension = if batch.parse::<usize>().is_ok() {
        String::new()
    } else {
        format!("extension tract_symbol {};\n", batch)
    };

    let graph = format!(
        "version 1.0;\n\
         {extension}\n\
         graph segmenter( input ) -> ( logits )\n\
         {{\n\
         \x20   input = external<scalar>(shape = [{batch}, {size}, {size}, 3]);\n\
         \x20   avg = mean_reduce(input, axes = [3]);\n\
         \x20   weights = constant<scalar>(shape = [1, 1, 1, {classes}], value = [{weights}]);\n\
         \x20   scores = mul(avg, weights);\n\
         \x20   logits = reshape(scores, shape = [-1, {classes}]);\n\
         }}\n"
    );

    let model_dir = dir.join("segmenter");
    std::fs::create_dir_all(&model_dir).unwrap();
    std::fs::write(model_dir.join("graph.nnef"), graph).unwrap();
    model_dir
}

/// Writes `model.pb`: a uint8 image placeholder under the default input
/// name, cast to f32 and exposed unchanged as `predict/predict`.
///
/// With three classes each pixel's scores are its own `(r, g, b)` values.
pub fn write_tf_passthrough(dir: &Path, size: usize) -> PathBuf {
    use tract_tensorflow::tfpb::{
        self,
        tensorflow::{tensor_shape_proto::Dim, DataType, TensorShapeProto},
    };

    let dims = [-1, size as i64, size as i64, 3];
    let shape = TensorShapeProto {
        dim: dims
            .iter()
            .map(|&size| Dim {
                size,
                name: String::new(),
            })
            .collect(),
        unknown_rank: false,
    };

    let path = dir.join("model.pb");
    tfpb::graph()
        .node(
            tfpb::node()
                .name(tessel_frozen::DEFAULT_INPUT)
                .op("Placeholder")
                .attr("dtype", DataType::DtUint8)
                .attr("shape", shape),
        )
        .node(
            tfpb::node()
                .name("predict/cast")
                .op("Cast")
                .input(tessel_frozen::DEFAULT_INPUT)
                .attr("SrcT", DataType::DtUint8)
                .attr("DstT", DataType::DtFloat),
        )
        .node(
            tfpb::node()
                .name(tessel_frozen::DEFAULT_OUTPUT)
                .op("Identity")
                .input("predict/cast")
                .attr("T", DataType::DtFloat),
        )
        .save_to(&path)
        .unwrap();
    path
}

/// Every pixel is `color`.
pub fn solid(width: u32, height: u32, color: [u8; 3]) -> tessel_vis::image::RgbImage {
    tessel_vis::image::RgbImage::from_pixel(width, height, tessel_vis::image::Rgb(color))
}

pub fn binding() -> tessel_frozen::TensorBinding {
    tessel_frozen::TensorBinding::new("input", "logits")
}

/// Left half black, right half gray.
pub fn half_black(width: u32, height: u32) -> tessel_vis::image::RgbImage {
    tessel_vis::image::RgbImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            tessel_vis::image::Rgb([0, 0, 0])
        } else {
            tessel_vis::image::Rgb([100, 100, 100])
        }
    })
}
