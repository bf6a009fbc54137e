/*!
Binding the segmentation input and score output to graph tensors by name.
*/

use crate::error::{FrozenError, Result, TensorRole};
use tract_core::prelude::*;
use tract_hir::prelude::InferenceModel;

/// Input placeholder of the exported graphs.
pub const DEFAULT_INPUT: &str = "source_input/image_batch/image_tensor";

/// Score output of the exported graphs.
pub const DEFAULT_OUTPUT: &str = "predict/predict";

/// How many node names an error carries.
const LISTED_NODES: usize = 32;

/// Names of the graph's image input and its per-pixel score output.
///
/// A trailing output-slot suffix such as `:0` is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorBinding {
    pub input: String,
    pub output: String,
}

impl Default for TensorBinding {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT, DEFAULT_OUTPUT)
    }
}

fn node_name(tensor: &str) -> &str {
    match tensor.rsplit_once(':') {
        Some((node, slot)) if slot.chars().all(|c| c.is_ascii_digit()) => node,
        _ => tensor,
    }
}

impl TensorBinding {
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }

    pub fn input_node(&self) -> &str {
        node_name(&self.input)
    }

    pub fn output_node(&self) -> &str {
        node_name(&self.output)
    }

    /// Make the bound tensors the only input and output of `graph`.
    pub(crate) fn apply<G: NamedGraph>(&self, graph: &mut G) -> Result<()> {
        for (role, name) in [
            (TensorRole::Input, self.input_node()),
            (TensorRole::Output, self.output_node()),
        ] {
            if !graph.contains_node(name) {
                let mut available = graph.node_names();
                available.truncate(LISTED_NODES);
                return Err(FrozenError::TensorNotFound {
                    role,
                    name: name.to_owned(),
                    available,
                });
            }
        }

        graph.rebind(self.input_node(), self.output_node())?;
        log::debug!("bound input {:?} and output {:?}", self.input, self.output);
        Ok(())
    }
}

/// The name-based graph surgery shared by inference and typed models.
pub(crate) trait NamedGraph {
    fn node_names(&self) -> Vec<String>;
    fn contains_node(&self, name: &str) -> bool;
    fn rebind(&mut self, input: &str, output: &str) -> TractResult<()>;
}

macro_rules! impl_named_graph {
    ($($model:ty),*) => {
        $(
            impl NamedGraph for $model {
                fn node_names(&self) -> Vec<String> {
                    self.nodes().iter().map(|node| node.name.clone()).collect()
                }

                fn contains_node(&self, name: &str) -> bool {
                    self.node_by_name(name).is_ok()
                }

                fn rebind(&mut self, input: &str, output: &str) -> TractResult<()> {
                    self.set_input_names([input])?;
                    self.set_output_names([output])
                }
            }
        )*
    };
}

impl_named_graph!(InferenceModel, TypedModel);
