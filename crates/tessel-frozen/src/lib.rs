/*!

# Tessel Frozen

Loads exported segmentation graphs (TensorFlow `.pb`, ONNX or NNEF) with
tract, binds their image input and score output by name, and runs them at a
fixed batch size.

 */

#![warn(rust_2018_idioms)]

pub use tract_core;

pub mod artifact;
mod binding;
mod driver;
mod error;
mod helpers;
mod model_api;
mod predictor;

pub use artifact::{init_thread, Artifact, ArtifactKind};
pub use binding::{TensorBinding, DEFAULT_INPUT, DEFAULT_OUTPUT};
pub use driver::InferenceDriver;
pub use error::{FrozenError, Result, TensorRole};
pub use model_api::{ModelApi, TensorSpec};
pub use predictor::FrozenModel;
