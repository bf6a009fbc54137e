// Author: Tessel Developers
// Copyright © 2026, Tessel Developers, all rights reserved.
// Created: 16 October 2026

use crate::stage::Stage;
use thiserror::Error;

/// Errors raised while assembling or running the network.
#[derive(Error, Debug)]
pub enum UNetError {
    #[error("invalid network configuration: {0}")]
    InvalidConfig(String),

    #[error("input of shape {shape:?} is not usable: {reason}")]
    IndivisibleInput { shape: Vec<usize>, reason: String },

    #[error("{stage}: spatial mismatch between concat operands, {left:?} vs {right:?}")]
    SpatialMismatch {
        stage: Stage,
        left: Vec<usize>,
        right: Vec<usize>,
    },

    #[error("{stage}: expected {expected} input channels, got {actual}")]
    ChannelMismatch {
        stage: Stage,
        expected: usize,
        actual: usize,
    },

    #[error("expected {expected} input values, got {actual}")]
    InputLength { expected: usize, actual: usize },

    #[error("no activation recorded for stage {0}")]
    MissingStage(Stage),

    #[error("stage {0} was recorded twice")]
    DuplicateStage(Stage),

    #[error(transparent)]
    Candle(#[from] candle::Error),
}

pub type Result<T, E = UNetError> = std::result::Result<T, E>;
