// Author: Tessel Developers
// Copyright © 2026, Tessel Developers, all rights reserved.
// Created: 16 October 2026

/*!
Typed identifiers for every node of the U-Net and the append-only registry
that collects their outputs during a forward pass.

Skip connections look up their encoder source through [`Stage`] rather than a
string key, so a typo is a compile error instead of a missing entry at runtime.
*/

use crate::error::{Result, UNetError};
use candle::Tensor;
use std::collections::HashMap;

macro_rules! stages {
    ($($variant:ident => $name:literal,)*) => {
        /// One named node in the U-Net.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Stage {
            $($variant,)*
        }

        impl Stage {
            /// Every stage in construction order.
            pub const ALL: &'static [Stage] = &[$(Stage::$variant,)*];

            /// The conventional layer name, also used as the parameter prefix.
            pub fn name(self) -> &'static str {
                match self {
                    $(Stage::$variant => $name,)*
                }
            }
        }
    };
}

stages! {
    Conv1_1 => "conv1_1",
    Conv1_2 => "conv1_2",
    Pool1 => "pool1",
    Conv2_1 => "conv2_1",
    Conv2_2 => "conv2_2",
    Pool2 => "pool2",
    Conv3_1 => "conv3_1",
    Conv3_2 => "conv3_2",
    Pool3 => "pool3",
    Dropout3 => "dropout3",
    Conv4_1 => "conv4_1",
    Conv4_2 => "conv4_2",
    Pool4 => "pool4",
    Dropout4 => "dropout4",
    Conv5_1 => "conv5_1",
    Conv5_2 => "conv5_2",
    Dropout5 => "dropout5",
    Upsample6 => "upsample6",
    Concat6 => "concat6",
    Conv6_1 => "conv6_1",
    Conv6_2 => "conv6_2",
    Dropout6 => "dropout6",
    Upsample7 => "upsample7",
    Concat7 => "concat7",
    Conv7_1 => "conv7_1",
    Conv7_2 => "conv7_2",
    Dropout7 => "dropout7",
    Upsample8 => "upsample8",
    Concat8 => "concat8",
    Conv8_1 => "conv8_1",
    Conv8_2 => "conv8_2",
    Upsample9 => "upsample9",
    Concat9 => "concat9",
    Conv9_1 => "conv9_1",
    Conv9_2 => "conv9_2",
    Conv10 => "conv10",
    Logits => "logits",
}

impl Stage {
    /// The decoder concatenation stages, deepest first.
    pub const CONCATS: [Stage; 4] = [Stage::Concat6, Stage::Concat7, Stage::Concat8, Stage::Concat9];
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.name())
    }
}

/// Collects stage outputs while the network runs.
///
/// Entries are only ever appended. Once the pass completes the registry is
/// frozen into [`Activations`].
#[derive(Default)]
pub struct StageRegistry {
    entries: Vec<(Stage, Tensor)>,
    index: HashMap<Stage, usize>,
}

impl StageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the output of `stage`, returning a handle to it for chaining.
    pub fn record(&mut self, stage: Stage, tensor: Tensor) -> Result<Tensor> {
        if self.index.contains_key(&stage) {
            return Err(UNetError::DuplicateStage(stage));
        }

        self.index.insert(stage, self.entries.len());
        self.entries.push((stage, tensor.clone()));
        Ok(tensor)
    }

    /// Look up a previously recorded stage.
    pub fn get(&self, stage: Stage) -> Result<&Tensor> {
        self.index
            .get(&stage)
            .map(|idx| &self.entries[*idx].1)
            .ok_or(UNetError::MissingStage(stage))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freeze the registry. Fails if the logits were never recorded.
    pub fn finish(self) -> Result<Activations> {
        if !self.index.contains_key(&Stage::Logits) {
            return Err(UNetError::MissingStage(Stage::Logits));
        }

        Ok(Activations {
            entries: self.entries,
            index: self.index,
        })
    }
}

/// Immutable record of every stage output from one forward pass.
pub struct Activations {
    entries: Vec<(Stage, Tensor)>,
    index: HashMap<Stage, usize>,
}

impl Activations {
    pub fn get(&self, stage: Stage) -> Option<&Tensor> {
        self.index.get(&stage).map(|idx| &self.entries[*idx].1)
    }

    /// The flat `(batch * height * width, num_classes)` score matrix.
    pub fn logits(&self) -> &Tensor {
        &self.entries[self.index[&Stage::Logits]].1
    }

    pub fn into_logits(mut self) -> Tensor {
        let idx = self.index[&Stage::Logits];
        self.entries.swap_remove(idx).1
    }

    /// Stage outputs in the order they were produced.
    pub fn iter(&self) -> impl Iterator<Item = (Stage, &Tensor)> {
        self.entries.iter().map(|(stage, tensor)| (*stage, tensor))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle::{DType, Device};

    #[test]
    fn names_are_unique() {
        let mut names: Vec<_> = Stage::ALL.iter().map(|s| s.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Stage::ALL.len());
    }

    #[test]
    fn rejects_duplicates() {
        let t = Tensor::zeros(1, DType::F32, &Device::Cpu).unwrap();
        let mut registry = StageRegistry::new();
        registry.record(Stage::Conv1_1, t.clone()).unwrap();
        assert!(matches!(
            registry.record(Stage::Conv1_1, t),
            Err(UNetError::DuplicateStage(Stage::Conv1_1))
        ));
    }

    #[test]
    fn missing_lookup_is_typed() {
        let registry = StageRegistry::new();
        assert!(matches!(
            registry.get(Stage::Conv4_2),
            Err(UNetError::MissingStage(Stage::Conv4_2))
        ));
    }

    #[test]
    fn finish_requires_logits() {
        let t = Tensor::zeros(1, DType::F32, &Device::Cpu).unwrap();
        let mut registry = StageRegistry::new();
        registry.record(Stage::Conv1_1, t).unwrap();
        assert!(registry.finish().is_err());
    }
}
