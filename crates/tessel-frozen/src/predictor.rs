// Author: Tessel Developers
// Copyright © 2026, Tessel Developers, all rights reserved.
// Created: 16 October 2026

/*!

*/

use crate::{
    artifact::{Artifact, LoadedGraph},
    binding::TensorBinding,
    error::{FrozenError, Result, TensorRole},
    helpers::{self, Plan},
    model_api::ModelApi,
};
use std::path::Path;
use tract_core::prelude::*;

/// A frozen graph optimized for one fixed `(batch, height, width, 3)` input.
pub struct FrozenModel {
    artifact: Artifact,
    api: ModelApi,
    plan: Plan,
    binding: TensorBinding,
    input_shape: [usize; 4],
    input_type: DatumType,
}

/// The first plan output as `f32`, or the bound output as missing.
fn first_output(outputs: &[TValue], binding: &TensorBinding) -> Result<Vec<f32>> {
    let Some(output) = outputs.first() else {
        return Err(FrozenError::TensorNotFound {
            role: TensorRole::Output,
            name: binding.output.clone(),
            available: Vec::new(),
        });
    };

    let output = output.cast_to::<f32>()?;
    Ok(output.as_slice::<f32>()?.to_vec())
}

impl FrozenModel {
    /// Load `path`, bind `binding` and build a plan for `batch_size` images of `height x width`.
    ///
    /// # Errors
    ///
    /// [`FrozenError::ArtifactNotFound`] is raised before tract is touched. A
    /// declared input shape that disagrees with the requested one is
    /// [`FrozenError::InputShapeMismatch`].
    pub fn load(
        path: impl AsRef<Path>,
        binding: &TensorBinding,
        batch_size: usize,
        (height, width): (usize, usize),
    ) -> Result<Self> {
        let artifact = Artifact::resolve(path)?;
        let input_shape = [batch_size, height, width, 3];

        let (api, plan) = match artifact.load()? {
            LoadedGraph::Inference(mut model) => {
                binding.apply(&mut model)?;
                helpers::build_inference_plan(model, &input_shape)?
            }
            LoadedGraph::Typed(mut model) => {
                binding.apply(&mut model)?;
                helpers::build_typed_plan(model, &input_shape)?
            }
        };

        let api = api.with_binding(binding);
        let input_type = api
            .inputs
            .first()
            .map_or(DatumType::F32, |input| input.datum_type);

        log::info!(
            "model ready: input {:?} {:?}, outputs {:?}",
            input_shape,
            input_type,
            api.outputs
        );

        Ok(Self {
            artifact,
            api,
            plan,
            binding: binding.clone(),
            input_shape,
            input_type,
        })
    }

    pub fn artifact(&self) -> &Artifact {
        &self.artifact
    }

    pub fn api(&self) -> &ModelApi {
        &self.api
    }

    pub fn batch_size(&self) -> usize {
        self.input_shape[0]
    }

    /// `(height, width)` of each image in the batch.
    pub fn image_size(&self) -> (usize, usize) {
        (self.input_shape[1], self.input_shape[2])
    }

    pub fn input_type(&self) -> DatumType {
        self.input_type
    }

    /// Run one batch of raw RGB bytes, laid out `(batch, height, width, 3)`.
    ///
    /// Returns the flattened output tensor converted to `f32`.
    pub fn predict_batch(&self, images: &[u8]) -> Result<Vec<f32>> {
        let expected: usize = self.input_shape.iter().product();
        if images.len() != expected {
            return Err(FrozenError::InputLength {
                expected,
                actual: images.len(),
            });
        }

        let input = match self.input_type {
            DatumType::U8 => Tensor::from_shape(&self.input_shape, images)?,
            DatumType::F32 => {
                let data: Vec<f32> = images.iter().map(|v| *v as f32).collect();
                Tensor::from_shape(&self.input_shape, &data)?
            }
            other => return Err(FrozenError::UnsupportedInputType(format!("{:?}", other))),
        };

        log::debug!("predicting batch of {}", self.batch_size());
        let outputs = self.plan.run(tvec!(input.into()))?;
        first_output(&outputs, &self.binding)
    }
}
