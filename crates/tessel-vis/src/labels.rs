// Author: Tessel Developers
// Copyright © 2026, Tessel Developers, all rights reserved.
// Created: 16 October 2026

/*!

*/

use crate::error::{Result, VisError};

#[cfg(feature = "threaded")]
use rayon::prelude::*;

/// Per-pixel class indices, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMap {
    pub height: usize,
    pub width: usize,
    pub labels: Vec<u32>,
}

impl LabelMap {
    pub fn new(height: usize, width: usize, labels: Vec<u32>) -> Result<Self> {
        let expected = height * width;
        if labels.len() != expected {
            return Err(VisError::ShapeMismatch {
                expected,
                actual: labels.len(),
            });
        }

        Ok(Self {
            height,
            width,
            labels,
        })
    }

    pub fn get(&self, row: usize, col: usize) -> Option<u32> {
        if row >= self.height || col >= self.width {
            return None;
        }

        Some(self.labels[row * self.width + col])
    }

    /// Largest label present, if any pixel exists.
    pub fn max_label(&self) -> Option<u32> {
        self.labels.iter().copied().max()
    }

    /// Pixel count per class for `classes` classes. Labels outside the range
    /// are not counted.
    pub fn histogram(&self, classes: usize) -> Vec<usize> {
        let mut counts = vec![0; classes];
        for label in &self.labels {
            if let Some(count) = counts.get_mut(*label as usize) {
                *count += 1;
            }
        }
        counts
    }
}

/// Index of the largest score; the first one wins a tie.
fn argmax(scores: &[f32]) -> u32 {
    let mut best = 0;
    for (idx, score) in scores.iter().enumerate().skip(1) {
        if *score > scores[best] {
            best = idx;
        }
    }
    best as u32
}

/// Reduce `(height * width, classes)` scores to a label map by argmax.
pub fn label_map_from_logits(
    scores: &[f32],
    height: usize,
    width: usize,
    classes: usize,
) -> Result<LabelMap> {
    if classes == 0 {
        return Err(VisError::NoClasses);
    }

    let expected = height * width * classes;
    if scores.len() != expected {
        return Err(VisError::ShapeMismatch {
            expected,
            actual: scores.len(),
        });
    }

    #[cfg(feature = "threaded")]
    let labels = scores.par_chunks(classes).map(argmax).collect();

    #[cfg(not(feature = "threaded"))]
    let labels = scores.chunks(classes).map(argmax).collect();

    Ok(LabelMap {
        height,
        width,
        labels,
    })
}
