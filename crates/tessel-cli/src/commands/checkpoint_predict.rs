use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tessel::core::{candle::Device, CheckpointPredictor, UNetConfig, Upsample};
use tessel::vis::{decode_labels, resize_linear, ColorMap};

/// Segment one image straight from a safetensors checkpoint.
#[derive(Parser, Debug)]
#[clap()]
pub(crate) struct Args {
    /// The checkpoint written during training.
    checkpoint: PathBuf,

    /// The image to segment.
    image: PathBuf,

    #[clap(long)]
    colormap: ColorMap,

    #[clap(long)]
    class_num: usize,

    #[clap(short, long, default_value_t = 8)]
    batch_size: usize,

    /// Filter count of the first encoder stage.
    #[clap(long, default_value_t = 64)]
    filters: usize,

    /// Decoder upsampling: deconv, bilinear or nearest.
    #[clap(long, default_value_t = Upsample::Deconv)]
    upsample: Upsample,

    /// The network was built without batch-normalization.
    #[clap(long)]
    no_batch_norm: bool,

    #[clap(short, long, default_value = "predict.png")]
    output: PathBuf,

    #[clap(long, default_value_t = 256)]
    height: usize,

    #[clap(long, default_value_t = 256)]
    width: usize,
}

pub(super) fn predict(config: Args) -> Result<()> {
    let net_config = UNetConfig {
        filters: config.filters,
        num_classes: config.class_num,
        batch_norm: !config.no_batch_norm,
        upsample: config.upsample,
        ..UNetConfig::default()
    };

    let image = tessel::vis::image::open(&config.image)
        .with_context(|| format!("failed to read {:?}", config.image))?
        .to_rgb8();
    let resized = resize_linear(&image, config.width as u32, config.height as u32);

    let predictor = CheckpointPredictor::load(
        &config.checkpoint,
        &net_config,
        config.batch_size,
        (config.height, config.width),
        Device::Cpu,
    )?;

    log::info!("predicting {:?}", config.image);
    let scores = predictor.predict(resized.as_raw())?;
    let colored = decode_labels(
        &scores,
        config.height,
        config.width,
        predictor.num_classes(),
        &config.colormap,
    )?;

    super::write_png(&colored, &config.output)
}
