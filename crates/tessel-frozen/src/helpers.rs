// Author: Tessel Developers
// Copyright © 2026, Tessel Developers, all rights reserved.
// Created: 16 October 2026

use crate::error::{FrozenError, Result};
use crate::model_api::ModelApi;
use tract_core::prelude::*;
use tract_hir::{infer::Factoid, prelude::*};

pub(crate) type Plan = TypedSimplePlan<TypedModel>;

fn check_input_type(datum_type: DatumType) -> Result<DatumType> {
    match datum_type {
        DatumType::U8 | DatumType::F32 => Ok(datum_type),
        other => Err(FrozenError::UnsupportedInputType(format!("{:?}", other))),
    }
}

fn mismatch(expected: &[usize], actual: Vec<String>) -> FrozenError {
    FrozenError::InputShapeMismatch {
        expected: expected.to_vec(),
        actual,
    }
}

/// Fix the input of a bound inference model to `shape` and optimize it.
pub(crate) fn build_inference_plan(
    mut model: InferenceModel,
    shape: &[usize],
) -> Result<(ModelApi, Plan)> {
    let fact = model.input_fact(0)?.clone();

    if let Some(rank) = fact.shape.rank().concretize() {
        let declared: Vec<Option<i64>> = fact
            .shape
            .dims()
            .map(|dim| dim.concretize().and_then(|v| v.to_i64().ok()))
            .collect();

        let disagrees = rank as usize != shape.len()
            || declared
                .iter()
                .zip(shape)
                .any(|(dim, want)| matches!(dim, Some(v) if *v as usize != *want));

        if disagrees {
            let actual = declared
                .iter()
                .map(|dim| dim.map_or_else(|| "?".to_owned(), |v| v.to_string()))
                .collect();
            return Err(mismatch(shape, actual));
        }
    }

    let datum_type = check_input_type(fact.datum_type.concretize().unwrap_or(DatumType::F32))?;

    let full_shape: TVec<TDim> = shape.iter().map(|v| v.to_dim()).collect();
    model.set_input_fact(0, InferenceFact::dt_shape(datum_type, full_shape))?;

    let outlets = model.output_outlets()?.len();
    for output in 0..outlets {
        model.set_output_fact(output, Default::default())?;
    }

    let typed = model.into_typed()?.into_decluttered()?;
    let api = ModelApi::for_typed_model(&typed)?;
    let plan = typed.into_optimized()?.into_runnable()?;

    Ok((api, plan))
}

/// Bind the symbolic input dimensions of a bound typed model to `shape` and optimize it.
pub(crate) fn build_typed_plan(model: TypedModel, shape: &[usize]) -> Result<(ModelApi, Plan)> {
    let fact = model.input_fact(0)?.clone();
    check_input_type(fact.datum_type)?;

    let actual = || fact.shape.iter().map(|dim| dim.to_string()).collect();
    if fact.shape.rank() != shape.len() {
        return Err(mismatch(shape, actual()));
    }

    let mut values = SymbolValues::default();
    for (dim, want) in fact.shape.iter().zip(shape) {
        match dim.to_i64() {
            Ok(v) if v as usize != *want => return Err(mismatch(shape, actual())),
            Ok(_) => {}
            Err(_) => {
                if let TDim::Sym(symbol) = dim {
                    values = values.with(symbol, *want as i64);
                }
            }
        }
    }

    let typed = model.concretize_dims(&values)?.into_decluttered()?;
    let api = ModelApi::for_typed_model(&typed)?;
    let plan = typed.into_optimized()?.into_runnable()?;

    Ok((api, plan))
}
