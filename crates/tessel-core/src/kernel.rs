/*!
Fixed bilinear-interpolation kernels for transposed-convolution upsampling.

The kernel for an upsampling `factor` is square with side
`2 * factor - factor % 2`. Each output channel only reads from the matching
input channel, so the weight tensor is diagonal in its two channel axes.
*/

use crate::error::{Result, UNetError};
use candle::{Device, Tensor};

/// Side length of the bilinear kernel for `factor`.
pub fn kernel_size(factor: usize) -> usize {
    2 * factor - factor % 2
}

/// A bilinear upsampling kernel laid out as `[k, k, channels, channels]`.
#[derive(Debug, Clone, PartialEq)]
pub struct BilinearKernel {
    factor: usize,
    size: usize,
    channels: usize,
    weights: Vec<f32>,
}

impl BilinearKernel {
    pub fn factor(&self) -> usize {
        self.factor
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Raw weights in `[k, k, in, out]` order.
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Weight at kernel position `(row, col)` connecting `input` to `output`.
    pub fn at(&self, row: usize, col: usize, input: usize, output: usize) -> f32 {
        let c = self.channels;
        self.weights[((row * self.size + col) * c + input) * c + output]
    }

    /// The 2D `k x k` kernel used by `channel`, row-major.
    pub fn channel_slice(&self, channel: usize) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.size * self.size);
        for row in 0..self.size {
            for col in 0..self.size {
                out.push(self.at(row, col, channel, channel));
            }
        }
        out
    }

    /// Convert to the `(c_in, c_out, k, k)` layout candle uses for transposed convolutions.
    pub fn to_tensor(&self, device: &Device) -> Result<Tensor> {
        let hwio = Tensor::from_vec(
            self.weights.clone(),
            (self.size, self.size, self.channels, self.channels),
            device,
        )?;

        Ok(hwio.permute((2, 3, 0, 1))?.contiguous()?)
    }
}

/// Synthesize the bilinear upsampling weights for `factor` and `channels`.
///
/// # Errors
///
/// Fails if either argument is zero.
pub fn bilinear_upsample_weights(factor: usize, channels: usize) -> Result<BilinearKernel> {
    if factor == 0 {
        return Err(UNetError::InvalidConfig(
            "upsampling factor must be at least 1".to_owned(),
        ));
    }

    if channels == 0 {
        return Err(UNetError::InvalidConfig(
            "bilinear kernel needs at least one channel".to_owned(),
        ));
    }

    let size = kernel_size(factor);
    let rfactor = (size + 1) / 2;
    let center = if size % 2 == 1 {
        (rfactor - 1) as f32
    } else {
        rfactor as f32 - 0.5
    };

    let taps: Vec<f32> = (0..size)
        .map(|idx| 1.0 - (idx as f32 - center).abs() / rfactor as f32)
        .collect();

    let mut weights = vec![0.0; size * size * channels * channels];
    for row in 0..size {
        for col in 0..size {
            let value = taps[row] * taps[col];
            for channel in 0..channels {
                weights[((row * size + col) * channels + channel) * channels + channel] = value;
            }
        }
    }

    Ok(BilinearKernel {
        factor,
        size,
        channels,
        weights,
    })
}
