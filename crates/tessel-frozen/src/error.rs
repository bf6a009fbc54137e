// Author: Tessel Developers
// Copyright © 2026, Tessel Developers, all rights reserved.
// Created: 16 October 2026

use std::path::PathBuf;
use tessel_vis::VisError;
use thiserror::Error;

/// Which end of the graph a tensor name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorRole {
    Input,
    Output,
}

impl std::fmt::Display for TensorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TensorRole::Input => f.pad("input"),
            TensorRole::Output => f.pad("output"),
        }
    }
}

/// Errors raised while loading or running a frozen graph.
#[derive(Error, Debug)]
pub enum FrozenError {
    #[error("no model artifact at {0:?}")]
    ArtifactNotFound(PathBuf),

    #[error("unrecognized model format: {0:?}")]
    UnknownFormat(PathBuf),

    #[error("{role} tensor {name:?} not found in graph, some of the available nodes: {available:?}")]
    TensorNotFound {
        role: TensorRole,
        name: String,
        available: Vec<String>,
    },

    #[error("model input is declared as {actual:?} but {expected:?} was requested")]
    InputShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<String>,
    },

    #[error("expected {expected} input bytes, got {actual}")]
    InputLength { expected: usize, actual: usize },

    #[error("model produced {actual} values, expected {expected}")]
    OutputShapeMismatch { expected: usize, actual: usize },

    #[error("unsupported model input type {0}, expected u8 or f32")]
    UnsupportedInputType(String),

    #[error(transparent)]
    Vis(#[from] VisError),

    #[error("tract error: {0:#}")]
    Tract(#[from] anyhow::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = FrozenError> = std::result::Result<T, E>;
