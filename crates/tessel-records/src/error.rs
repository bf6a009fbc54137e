// Author: Tessel Developers
// Copyright © 2026, Tessel Developers, all rights reserved.
// Created: 16 October 2026

use thiserror::Error;

/// Errors raised by record files and the batch pipeline.
#[derive(Error, Debug)]
pub enum RecordError {
    /// The epoch limit was reached and every full batch has been handed out.
    #[error("the record stream is exhausted")]
    Exhausted,

    #[error("malformed record: {0}")]
    Malformed(String),

    #[error("field {field:?} holds {actual} bytes, expected {expected}")]
    ShapeMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    #[error("pipeline worker {0:?} panicked")]
    WorkerPanicked(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Tensor(#[from] candle::Error),
}

impl RecordError {
    /// True for the expected end of the stream, false for fatal failures.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, RecordError::Exhausted)
    }
}

pub type Result<T, E = RecordError> = std::result::Result<T, E>;
