/*!
Network configuration. Every default lives in [`UNetConfig::default`].
*/

use crate::error::{Result, UNetError};
use std::str::FromStr;

/// Per-channel mean subtracted from raw pixels before scaling by 1/255.
pub const PIXEL_MEAN: [f32; 3] = [104.0, 117.0, 123.0];

/// Normalize a single raw pixel byte belonging to `channel`.
#[inline]
pub fn normalize_pixel(value: u8, channel: usize) -> f32 {
    (value as f32 - PIXEL_MEAN[channel]) * (1.0 / 255.0)
}

/// Normalize an interleaved `(.., 3)` RGB byte buffer.
pub fn normalize_pixels(raw: &[u8]) -> Vec<f32> {
    raw.iter()
        .enumerate()
        .map(|(idx, value)| normalize_pixel(*value, idx % 3))
        .collect()
}

/// How the decoder doubles its spatial resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Upsample {
    /// Learned 3x3 transposed convolution, followed by batch-norm and ReLU.
    #[default]
    Deconv,
    /// Transposed convolution with fixed bilinear weights, no activation.
    Bilinear,
    /// Nearest-neighbour resize.
    Nearest,
}

impl FromStr for Upsample {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deconv" => Ok(Upsample::Deconv),
            "bilinear" => Ok(Upsample::Bilinear),
            "nearest" => Ok(Upsample::Nearest),
            _ => Err(format!("unknown upsample mode: {}", s)),
        }
    }
}

impl std::fmt::Display for Upsample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Upsample::Deconv => f.pad("deconv"),
            Upsample::Bilinear => f.pad("bilinear"),
            Upsample::Nearest => f.pad("nearest"),
        }
    }
}

/// Configuration for [`crate::UNet`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UNetConfig {
    /// Filter count of the first encoder stage; deeper stages use multiples of it.
    pub filters: usize,

    /// Number of output classes per pixel.
    pub num_classes: usize,

    /// Dropout keep-probability for stages 3-5 and decoder stages 6-7.
    pub keep_prob: f32,

    /// Insert batch-normalization between convolution and ReLU.
    pub batch_norm: bool,

    /// Decoder upsampling variant.
    pub upsample: Upsample,
}

impl Default for UNetConfig {
    fn default() -> Self {
        Self {
            filters: 64,
            num_classes: 21,
            keep_prob: 0.75,
            batch_norm: true,
            upsample: Upsample::Deconv,
        }
    }
}

impl UNetConfig {
    /// Check that the configuration can produce a network.
    pub fn validate(&self) -> Result<()> {
        if self.filters == 0 {
            return Err(UNetError::InvalidConfig(
                "base filter count must be at least 1".to_owned(),
            ));
        }

        if self.num_classes == 0 {
            return Err(UNetError::InvalidConfig(
                "class count must be at least 1".to_owned(),
            ));
        }

        if !(self.keep_prob > 0.0 && self.keep_prob <= 1.0) {
            return Err(UNetError::InvalidConfig(format!(
                "keep probability must be in (0, 1], got {}",
                self.keep_prob
            )));
        }

        Ok(())
    }

    /// The dropout probability handed to candle.
    pub fn drop_prob(&self) -> f32 {
        1.0 - self.keep_prob
    }
}
