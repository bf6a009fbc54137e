/*!
Layer primitives. Each one wraps a single candle operation plus the shape
checks and logging the assembler relies on. Tensors are NCHW here; the
NHWC boundary is handled by [`crate::UNet`].
*/

use crate::error::{Result, UNetError};
use crate::kernel::bilinear_upsample_weights;
use crate::stage::Stage;
use candle::{Module, ModuleT, Tensor};
use candle_nn::{
    batch_norm, conv2d, conv2d_no_bias, conv_transpose2d, BatchNorm, BatchNormConfig, Conv2d,
    Conv2dConfig, ConvTranspose2d, ConvTranspose2dConfig, Dropout, VarBuilder,
};

fn same_padding(ksize: usize) -> usize {
    ksize / 2
}

fn check_channels(stage: Stage, xs: &Tensor, expected: usize) -> Result<()> {
    let actual = xs.dim(1)?;
    if actual != expected {
        return Err(UNetError::ChannelMismatch {
            stage,
            expected,
            actual,
        });
    }
    Ok(())
}

/// A square convolution with "same" padding, optionally followed by
/// batch-normalization and ReLU.
#[derive(Debug)]
pub struct ConvRelu {
    stage: Stage,
    conv: Conv2d,
    norm: Option<BatchNorm>,
    activation: bool,
    ksize: usize,
    in_channels: usize,
    out_channels: usize,
}

/// Convolution + (batch-norm) + ReLU, with bias.
pub fn conv_relu(
    in_channels: usize,
    out_channels: usize,
    ksize: usize,
    stage: Stage,
    with_batch_norm: bool,
    vb: VarBuilder<'_>,
) -> Result<ConvRelu> {
    let config = Conv2dConfig {
        padding: same_padding(ksize),
        ..Default::default()
    };

    let norm = if with_batch_norm {
        Some(batch_norm(
            out_channels,
            BatchNormConfig::default(),
            vb.pp("batch_norm"),
        )?)
    } else {
        None
    };

    let conv = conv2d(in_channels, out_channels, ksize, config, vb)?;

    Ok(ConvRelu {
        stage,
        conv,
        norm,
        activation: true,
        ksize,
        in_channels,
        out_channels,
    })
}

/// Plain convolution without bias or activation, used for the score head.
pub fn conv_linear(
    in_channels: usize,
    out_channels: usize,
    ksize: usize,
    stage: Stage,
    vb: VarBuilder<'_>,
) -> Result<ConvRelu> {
    let config = Conv2dConfig {
        padding: same_padding(ksize),
        ..Default::default()
    };

    let conv = conv2d_no_bias(in_channels, out_channels, ksize, config, vb)?;

    Ok(ConvRelu {
        stage,
        conv,
        norm: None,
        activation: false,
        ksize,
        in_channels,
        out_channels,
    })
}

impl ConvRelu {
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn out_channels(&self) -> usize {
        self.out_channels
    }

    pub fn forward_t(&self, xs: &Tensor, train: bool) -> Result<Tensor> {
        check_channels(self.stage, xs, self.in_channels)?;

        let mut out = self.conv.forward(xs)?;
        if let Some(norm) = &self.norm {
            out = norm.forward_t(&out, train)?;
        }

        if self.activation {
            out = out.relu()?;
        }

        log::debug!(
            "layer {}, filter {:?}, output {:?}",
            self.stage,
            (self.ksize, self.ksize, self.in_channels, self.out_channels),
            out.dims()
        );
        Ok(out)
    }
}

impl ModuleT for ConvRelu {
    fn forward_t(&self, xs: &Tensor, train: bool) -> candle::Result<Tensor> {
        ConvRelu::forward_t(self, xs, train).map_err(candle::Error::wrap)
    }
}

/// Pooling flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolKind {
    Max,
    Avg,
}

/// Non-overlapping `ksize x ksize` pooling.
pub fn pool(xs: &Tensor, ksize: usize, kind: PoolKind, stage: Stage) -> Result<Tensor> {
    let out = match kind {
        PoolKind::Max => xs.max_pool2d(ksize)?,
        PoolKind::Avg => xs.avg_pool2d(ksize)?,
    };

    log::debug!("layer {}, {:?}, {:?}", stage, out.dims(), kind);
    Ok(out)
}

/// Dropout that is only active while training. `drop_prob` is `1 - keep_prob`.
pub fn dropout(xs: &Tensor, drop_prob: f32, train: bool, stage: Stage) -> Result<Tensor> {
    let out = if drop_prob > 0.0 {
        Dropout::new(drop_prob).forward(xs, train)?
    } else {
        xs.clone()
    };

    log::debug!("layer {}, {:?}", stage, out.dims());
    Ok(out)
}

/// Concatenate a decoder tensor with its encoder skip along the channel axis.
///
/// # Errors
///
/// Both operands must agree on batch, height and width.
pub fn concat(stage: Stage, upsampled: &Tensor, skip: &Tensor) -> Result<Tensor> {
    let (n_up, _, h_up, w_up) = upsampled.dims4()?;
    let (n_skip, _, h_skip, w_skip) = skip.dims4()?;

    if (n_up, h_up, w_up) != (n_skip, h_skip, w_skip) {
        return Err(UNetError::SpatialMismatch {
            stage,
            left: upsampled.dims().to_vec(),
            right: skip.dims().to_vec(),
        });
    }

    let out = Tensor::cat(&[upsampled, skip], 1)?;
    log::debug!("layer {}, {:?}", stage, out.dims());
    Ok(out)
}

/// Decoder upsampling layer; see [`crate::Upsample`].
#[derive(Debug)]
pub enum Upsampler {
    Deconv {
        stage: Stage,
        conv: ConvTranspose2d,
        norm: Option<BatchNorm>,
        channels: usize,
    },
    Bilinear {
        stage: Stage,
        kernel: Tensor,
        factor: usize,
        channels: usize,
    },
    Nearest {
        stage: Stage,
        factor: usize,
    },
}

/// Learned 3x3 transposed convolution upsampling by `factor`, keeping the channel count.
pub fn deconv(
    channels: usize,
    factor: usize,
    stage: Stage,
    with_batch_norm: bool,
    vb: VarBuilder<'_>,
) -> Result<Upsampler> {
    if factor == 0 {
        return Err(UNetError::InvalidConfig(
            "upsampling factor must be at least 1".to_owned(),
        ));
    }

    // Output is exactly `factor` times the input for a 3x3 kernel.
    let config = ConvTranspose2dConfig {
        padding: 1,
        output_padding: factor - 1,
        stride: factor,
        dilation: 1,
    };

    let norm = if with_batch_norm {
        Some(batch_norm(
            channels,
            BatchNormConfig::default(),
            vb.pp("batch_norm"),
        )?)
    } else {
        None
    };

    let conv = conv_transpose2d(channels, channels, 3, config, vb)?;

    Ok(Upsampler::Deconv {
        stage,
        conv,
        norm,
        channels,
    })
}

/// Transposed convolution with fixed bilinear weights; nothing is trained.
pub fn deconv_upsample(
    channels: usize,
    factor: usize,
    stage: Stage,
    device: &candle::Device,
) -> Result<Upsampler> {
    let kernel = bilinear_upsample_weights(factor, channels)?.to_tensor(device)?;

    Ok(Upsampler::Bilinear {
        stage,
        kernel,
        factor,
        channels,
    })
}

/// Nearest-neighbour resize by `factor`.
pub fn upsample_nearest(factor: usize, stage: Stage) -> Upsampler {
    Upsampler::Nearest { stage, factor }
}

impl Upsampler {
    pub fn stage(&self) -> Stage {
        match self {
            Upsampler::Deconv { stage, .. }
            | Upsampler::Bilinear { stage, .. }
            | Upsampler::Nearest { stage, .. } => *stage,
        }
    }

    pub fn forward_t(&self, xs: &Tensor, train: bool) -> Result<Tensor> {
        let out = match self {
            Upsampler::Deconv {
                stage,
                conv,
                norm,
                channels,
            } => {
                check_channels(*stage, xs, *channels)?;
                let mut out = conv.forward(xs)?;
                if let Some(norm) = norm {
                    out = norm.forward_t(&out, train)?;
                }
                out.relu()?
            }
            Upsampler::Bilinear {
                stage,
                kernel,
                factor,
                channels,
            } => {
                check_channels(*stage, xs, *channels)?;
                xs.conv_transpose2d(kernel, factor / 2, 0, *factor, 1)?
            }
            Upsampler::Nearest { factor, .. } => {
                let (_, _, h, w) = xs.dims4()?;
                xs.upsample_nearest2d(h * factor, w * factor)?
            }
        };

        log::debug!("layer {}, {:?}", self.stage(), out.dims());
        Ok(out)
    }
}

impl ModuleT for Upsampler {
    fn forward_t(&self, xs: &Tensor, train: bool) -> candle::Result<Tensor> {
        Upsampler::forward_t(self, xs, train).map_err(candle::Error::wrap)
    }
}
