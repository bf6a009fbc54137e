// Author: Tessel Developers
// Copyright © 2026, Tessel Developers, all rights reserved.
// Created: 16 October 2026

/*!
The U-Net: five encoder stages, four decoder stages with skip connections and
a 1x1 score head.

| Stage | Operation                                   | Channels      | Scale |
| ----- | ------------------------------------------- | ------------- | ----- |
| 1     | 2x conv                                     | `f`           | 1     |
| 2     | pool, 2x conv                               | `2f`          | 1/2   |
| 3     | pool, 2x conv                               | `4f`          | 1/4   |
| 4     | pool, dropout, 2x conv                      | `8f`          | 1/8   |
| 5     | pool, dropout, 2x conv, dropout             | `16f`         | 1/16  |
| 6     | upsample, concat(4), 2x conv, dropout       | `8f`          | 1/8   |
| 7     | upsample, concat(3), 2x conv, dropout       | `4f`          | 1/4   |
| 8     | upsample, concat(2), 2x conv                | `2f`          | 1/2   |
| 9     | upsample, concat(1), 2x conv                | `f`           | 1     |
| 10    | 1x1 conv, no activation                     | `num_classes` | 1     |

Inputs and the flattened output are NHWC; internally candle works in NCHW.
*/

use crate::config::{UNetConfig, Upsample};
use crate::error::{Result, UNetError};
use crate::layers::{
    self, concat, conv_linear, conv_relu, deconv, deconv_upsample, upsample_nearest, ConvRelu,
    PoolKind, Upsampler,
};
use crate::stage::{Activations, Stage, StageRegistry};
use candle::{ModuleT, Tensor};
use candle_nn::VarBuilder;

/// Total downsampling between the input and the bottleneck.
pub const DOWNSAMPLE: usize = 16;

struct DoubleConv {
    first: ConvRelu,
    second: ConvRelu,
}

impl DoubleConv {
    fn new(
        in_channels: usize,
        out_channels: usize,
        stages: (Stage, Stage),
        batch_norm: bool,
        vb: &VarBuilder<'_>,
    ) -> Result<Self> {
        let first = conv_relu(
            in_channels,
            out_channels,
            3,
            stages.0,
            batch_norm,
            vb.pp(stages.0.name()),
        )?;
        let second = conv_relu(
            out_channels,
            out_channels,
            3,
            stages.1,
            batch_norm,
            vb.pp(stages.1.name()),
        )?;

        Ok(Self { first, second })
    }

    fn forward_t(&self, xs: &Tensor, train: bool, registry: &mut StageRegistry) -> Result<Tensor> {
        let xs = registry.record(self.first.stage(), self.first.forward_t(xs, train)?)?;
        registry.record(self.second.stage(), self.second.forward_t(&xs, train)?)
    }
}

/// The assembled network. Parameters are created once in [`UNet::new`].
pub struct UNet {
    config: UNetConfig,
    block1: DoubleConv,
    block2: DoubleConv,
    block3: DoubleConv,
    block4: DoubleConv,
    block5: DoubleConv,
    upsample6: Upsampler,
    block6: DoubleConv,
    upsample7: Upsampler,
    block7: DoubleConv,
    upsample8: Upsampler,
    block8: DoubleConv,
    upsample9: Upsampler,
    block9: DoubleConv,
    head: ConvRelu,
}

fn upsampler(
    config: &UNetConfig,
    channels: usize,
    stage: Stage,
    vb: &VarBuilder<'_>,
) -> Result<Upsampler> {
    match config.upsample {
        Upsample::Deconv => deconv(channels, 2, stage, config.batch_norm, vb.pp(stage.name())),
        Upsample::Bilinear => deconv_upsample(channels, 2, stage, vb.device()),
        Upsample::Nearest => Ok(upsample_nearest(2, stage)),
    }
}

impl UNet {
    /// Create every layer of the network, pulling parameters from `vb`.
    pub fn new(config: &UNetConfig, vb: VarBuilder<'_>) -> Result<Self> {
        config.validate()?;

        let f = config.filters;
        let bn = config.batch_norm;

        let block1 = DoubleConv::new(3, f, (Stage::Conv1_1, Stage::Conv1_2), bn, &vb)?;
        let block2 = DoubleConv::new(f, f * 2, (Stage::Conv2_1, Stage::Conv2_2), bn, &vb)?;
        let block3 = DoubleConv::new(f * 2, f * 4, (Stage::Conv3_1, Stage::Conv3_2), bn, &vb)?;
        let block4 = DoubleConv::new(f * 4, f * 8, (Stage::Conv4_1, Stage::Conv4_2), bn, &vb)?;
        let block5 = DoubleConv::new(f * 8, f * 16, (Stage::Conv5_1, Stage::Conv5_2), bn, &vb)?;

        // Upsampling keeps the channel count; the concat adds the skip's channels.
        let upsample6 = upsampler(config, f * 16, Stage::Upsample6, &vb)?;
        let block6 = DoubleConv::new(f * 24, f * 8, (Stage::Conv6_1, Stage::Conv6_2), bn, &vb)?;

        let upsample7 = upsampler(config, f * 8, Stage::Upsample7, &vb)?;
        let block7 = DoubleConv::new(f * 12, f * 4, (Stage::Conv7_1, Stage::Conv7_2), bn, &vb)?;

        let upsample8 = upsampler(config, f * 4, Stage::Upsample8, &vb)?;
        let block8 = DoubleConv::new(f * 6, f * 2, (Stage::Conv8_1, Stage::Conv8_2), bn, &vb)?;

        let upsample9 = upsampler(config, f * 2, Stage::Upsample9, &vb)?;
        let block9 = DoubleConv::new(f * 3, f, (Stage::Conv9_1, Stage::Conv9_2), bn, &vb)?;

        let head = conv_linear(
            f,
            config.num_classes,
            1,
            Stage::Conv10,
            vb.pp(Stage::Conv10.name()),
        )?;

        Ok(Self {
            config: *config,
            block1,
            block2,
            block3,
            block4,
            block5,
            upsample6,
            block6,
            upsample7,
            block7,
            upsample8,
            block8,
            upsample9,
            block9,
            head,
        })
    }

    pub fn config(&self) -> &UNetConfig {
        &self.config
    }

    fn check_input(xs: &Tensor) -> Result<()> {
        let dims = xs.dims().to_vec();
        let reason = match dims.as_slice() {
            [_, h, w, 3] if h % DOWNSAMPLE == 0 && w % DOWNSAMPLE == 0 && *h > 0 && *w > 0 => {
                return Ok(())
            }
            [_, _, _, 3] => format!("height and width must be non-zero multiples of {DOWNSAMPLE}"),
            [_, _, _, actual] => {
                return Err(UNetError::ChannelMismatch {
                    stage: Stage::Conv1_1,
                    expected: 3,
                    actual: *actual,
                })
            }
            _ => "expected a (batch, height, width, 3) tensor".to_owned(),
        };

        Err(UNetError::IndivisibleInput {
            shape: dims,
            reason,
        })
    }

    /// Run the network on an NHWC batch, keeping every stage output.
    ///
    /// Dropout and batch statistics are only used when `train` is set.
    pub fn forward_t(&self, xs: &Tensor, train: bool) -> Result<Activations> {
        Self::check_input(xs)?;
        log::debug!("the input shape: {:?}", xs.dims());

        let drop = self.config.drop_prob();
        let mut net = StageRegistry::new();
        let x = xs.permute((0, 3, 1, 2))?.contiguous()?;

        // Encoder.
        let x = self.block1.forward_t(&x, train, &mut net)?;
        let x = net.record(Stage::Pool1, layers::pool(&x, 2, PoolKind::Max, Stage::Pool1)?)?;

        let x = self.block2.forward_t(&x, train, &mut net)?;
        let x = net.record(Stage::Pool2, layers::pool(&x, 2, PoolKind::Max, Stage::Pool2)?)?;

        let x = self.block3.forward_t(&x, train, &mut net)?;
        let x = net.record(Stage::Pool3, layers::pool(&x, 2, PoolKind::Max, Stage::Pool3)?)?;
        let x = net.record(
            Stage::Dropout3,
            layers::dropout(&x, drop, train, Stage::Dropout3)?,
        )?;

        let x = self.block4.forward_t(&x, train, &mut net)?;
        let x = net.record(Stage::Pool4, layers::pool(&x, 2, PoolKind::Max, Stage::Pool4)?)?;
        let x = net.record(
            Stage::Dropout4,
            layers::dropout(&x, drop, train, Stage::Dropout4)?,
        )?;

        let x = self.block5.forward_t(&x, train, &mut net)?;
        let x = net.record(
            Stage::Dropout5,
            layers::dropout(&x, drop, train, Stage::Dropout5)?,
        )?;

        // Decoder.
        let x = self.decode(&x, train, &mut net, &self.upsample6, Stage::Conv4_2, Stage::Concat6)?;
        let x = self.block6.forward_t(&x, train, &mut net)?;
        let x = net.record(
            Stage::Dropout6,
            layers::dropout(&x, drop, train, Stage::Dropout6)?,
        )?;

        let x = self.decode(&x, train, &mut net, &self.upsample7, Stage::Conv3_2, Stage::Concat7)?;
        let x = self.block7.forward_t(&x, train, &mut net)?;
        let x = net.record(
            Stage::Dropout7,
            layers::dropout(&x, drop, train, Stage::Dropout7)?,
        )?;

        let x = self.decode(&x, train, &mut net, &self.upsample8, Stage::Conv2_2, Stage::Concat8)?;
        let x = self.block8.forward_t(&x, train, &mut net)?;

        let x = self.decode(&x, train, &mut net, &self.upsample9, Stage::Conv1_2, Stage::Concat9)?;
        let x = self.block9.forward_t(&x, train, &mut net)?;

        // Score head.
        let x = net.record(Stage::Conv10, self.head.forward_t(&x, train)?)?;
        let logits = x
            .permute((0, 2, 3, 1))?
            .contiguous()?
            .reshape(((), self.config.num_classes))?;
        log::debug!("the model output shape: {:?}", logits.dims());
        net.record(Stage::Logits, logits)?;

        net.finish()
    }

    fn decode(
        &self,
        xs: &Tensor,
        train: bool,
        net: &mut StageRegistry,
        upsample: &Upsampler,
        skip: Stage,
        stage: Stage,
    ) -> Result<Tensor> {
        let up = net.record(upsample.stage(), upsample.forward_t(xs, train)?)?;
        let merged = concat(stage, &up, net.get(skip)?)?;
        net.record(stage, merged)
    }

    /// Run the network and return only the `(batch * h * w, num_classes)` logits.
    pub fn logits_t(&self, xs: &Tensor, train: bool) -> Result<Tensor> {
        Ok(self.forward_t(xs, train)?.into_logits())
    }
}

impl ModuleT for UNet {
    fn forward_t(&self, xs: &Tensor, train: bool) -> candle::Result<Tensor> {
        self.logits_t(xs, train).map_err(candle::Error::wrap)
    }
}
