/*!
Saving and restoring network parameters as safetensors, and a single-image
predictor that runs straight from a checkpoint.
*/

use crate::config::{normalize_pixels, UNetConfig};
use crate::error::{Result, UNetError};
use crate::unet::UNet;
use candle::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use std::path::Path;

/// Write every variable in `varmap` to `path`.
pub fn save_checkpoint(varmap: &VarMap, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    varmap.save(path)?;
    log::info!("saved checkpoint to {:?}", path);
    Ok(())
}

impl UNet {
    /// Rebuild a network from a checkpoint written by [`save_checkpoint`].
    ///
    /// The configuration must match the one used when saving; a parameter of
    /// the wrong shape surfaces as a candle error.
    pub fn from_checkpoint(
        path: impl AsRef<Path>,
        config: &UNetConfig,
        device: &Device,
    ) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(candle::Error::from)?;
        let vb = VarBuilder::from_buffered_safetensors(data, DType::F32, device)?;

        log::info!("loading checkpoint {:?}", path);
        UNet::new(config, vb)
    }
}

/// Predicts one image at a time with a network that expects a fixed batch.
///
/// The image is replicated across the batch and only the first slot is kept.
pub struct CheckpointPredictor {
    net: UNet,
    device: Device,
    batch_size: usize,
    height: usize,
    width: usize,
}

impl CheckpointPredictor {
    pub fn new(
        net: UNet,
        batch_size: usize,
        (height, width): (usize, usize),
        device: Device,
    ) -> Result<Self> {
        if batch_size == 0 {
            return Err(UNetError::InvalidConfig(
                "batch size must be at least 1".to_owned(),
            ));
        }

        Ok(Self {
            net,
            device,
            batch_size,
            height,
            width,
        })
    }

    pub fn load(
        path: impl AsRef<Path>,
        config: &UNetConfig,
        batch_size: usize,
        size: (usize, usize),
        device: Device,
    ) -> Result<Self> {
        let net = UNet::from_checkpoint(path, config, &device)?;
        Self::new(net, batch_size, size, device)
    }

    pub fn num_classes(&self) -> usize {
        self.net.config().num_classes
    }

    /// Predict raw `(height, width, 3)` RGB bytes, returning the
    /// `(height * width, num_classes)` scores of the image row-major.
    pub fn predict(&self, image: &[u8]) -> Result<Vec<f32>> {
        let pixels = self.height * self.width;
        let expected = pixels * 3;
        if image.len() != expected {
            return Err(UNetError::InputLength {
                expected,
                actual: image.len(),
            });
        }

        let single = Tensor::from_vec(
            normalize_pixels(image),
            (1, self.height, self.width, 3),
            &self.device,
        )?;
        let batch = single.repeat((self.batch_size, 1, 1, 1))?;

        let logits = self.net.logits_t(&batch, false)?;
        let first = logits.narrow(0, 0, pixels)?;

        Ok(first.flatten_all()?.to_vec1::<f32>()?)
    }
}
