/*!

# Tessel Records

Record files holding `(name, image, mask)` examples and the multi-threaded
shuffling pipeline that turns them into fixed-size training batches.

 */

#![warn(rust_2018_idioms)]

pub mod coordinator;
mod decode;
mod error;
pub mod format;
mod pipeline;
pub mod queue;

pub use decode::{decode_example, DecodedExample};
pub use error::{RecordError, Result};
pub use format::{Example, RecordReader, RecordWriter};
pub use pipeline::{Batch, BatchPipeline, PipelineConfig};
