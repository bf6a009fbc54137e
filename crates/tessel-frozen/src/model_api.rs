// Author: Tessel Developers
// Copyright © 2026, Tessel Developers, all rights reserved.
// Created: 16 October 2026

use crate::binding::TensorBinding;
use tract_core::prelude::*;

/// Name, shape and element type of one graph endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorSpec {
    pub name: String,
    /// Concrete dimensions; symbolic ones are left out.
    pub shape: Vec<usize>,
    pub datum_type: DatumType,
}

impl TensorSpec {
    pub fn element_count(&self) -> usize {
        self.shape.iter().product()
    }
}

/// The `ModelApi` describes the inputs and outputs of a bound model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelApi {
    pub inputs: Vec<TensorSpec>,
    pub outputs: Vec<TensorSpec>,
}

fn clean_name(name: &str) -> String {
    let name = name.split(':').next().unwrap_or(name);
    name.strip_suffix("_0").unwrap_or(name).to_owned()
}

fn spec(name: &str, fact: &TypedFact) -> TensorSpec {
    TensorSpec {
        name: clean_name(name),
        shape: fact
            .shape
            .iter()
            .filter_map(|dim| dim.to_i64().ok().map(|v| v as usize))
            .collect(),
        datum_type: fact.datum_type,
    }
}

impl ModelApi {
    /// Extract the model API from the provided typed model.
    pub fn for_typed_model(model: &TypedModel) -> TractResult<Self> {
        let mut inputs = Vec::with_capacity(model.inputs.len());
        for (idx, outlet) in model.inputs.iter().enumerate() {
            let node = model.node(outlet.node);
            inputs.push(spec(&node.name, model.input_fact(idx)?));
        }

        let mut outputs = Vec::with_capacity(model.outputs.len());
        for (idx, outlet) in model.outputs.iter().enumerate() {
            let label = model
                .outlet_labels
                .get(outlet)
                .cloned()
                .unwrap_or_else(|| model.node(outlet.node).name.clone());
            outputs.push(spec(&label, model.output_fact(idx)?));
        }

        Ok(Self { inputs, outputs })
    }

    /// Report the single input and output under the names they were bound by.
    ///
    /// Decluttering can fold the bound nodes away, leaving the graph's own
    /// labels on the surviving outlets.
    pub(crate) fn with_binding(mut self, binding: &TensorBinding) -> Self {
        if let [input] = self.inputs.as_mut_slice() {
            input.name = binding.input_node().to_owned();
        }

        if let [output] = self.outputs.as_mut_slice() {
            output.name = binding.output_node().to_owned();
        }

        self
    }
}
