/*!

# Tessel Core

The U-Net segmentation network built on candle: configuration, layer
primitives, the fixed bilinear upsampling kernel and checkpoints.

```no_run
use candle::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use tessel_core::prelude::*;

let varmap = VarMap::new();
let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
let net = UNet::new(&UNetConfig::default(), vb)?;

let images = Tensor::zeros((1, 256, 256, 3), DType::F32, &Device::Cpu)?;
let logits = net.forward_t(&images, false)?.into_logits();
assert_eq!(logits.dims(), &[256 * 256, 21]);
# Ok::<(), tessel_core::UNetError>(())
```

 */

#![warn(rust_2018_idioms)]

pub use candle;
pub use candle_nn;

mod checkpoint;
mod config;
mod error;
pub mod kernel;
pub mod layers;
pub mod stage;
mod unet;

pub use checkpoint::{save_checkpoint, CheckpointPredictor};
pub use config::{normalize_pixel, normalize_pixels, UNetConfig, Upsample, PIXEL_MEAN};
pub use error::{Result, UNetError};
pub use unet::{UNet, DOWNSAMPLE};

/// Most core utilities are re-exported here.
pub mod prelude {
    pub use super::checkpoint::{save_checkpoint, CheckpointPredictor};
    pub use super::config::{UNetConfig, Upsample};
    pub use super::error::UNetError;
    pub use super::kernel::{bilinear_upsample_weights, BilinearKernel};
    pub use super::stage::{Activations, Stage};
    pub use super::unet::UNet;
}
