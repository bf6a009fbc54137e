use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tessel::frozen::{InferenceDriver, TensorBinding, DEFAULT_INPUT, DEFAULT_OUTPUT};
use tessel::vis::ColorMap;

/// Segment one image with a frozen model and write the colored labels.
#[derive(Parser, Debug)]
#[clap()]
pub(crate) struct Args {
    /// Color map for the output: voc, or uavid (also yuuuav).
    #[clap(long)]
    colormap: ColorMap,

    /// Image file name, relative to the image directory.
    #[clap(long)]
    img: PathBuf,

    /// Number of classes the model was trained with.
    #[clap(long)]
    class_num: usize,

    /// The batch size the model was frozen with.
    #[clap(short, long)]
    batch_size: usize,

    #[clap(long, default_value = "./predict_image")]
    image_dir: PathBuf,

    /// A directory holding model.pb, or a model file (.pb, .onnx, .nnef.tar).
    #[clap(long, default_value = "./final_model")]
    model_dir: PathBuf,

    #[clap(short, long, default_value = "./predict_image/predict.png")]
    output: PathBuf,

    #[clap(long, default_value_t = 256)]
    height: usize,

    #[clap(long, default_value_t = 256)]
    width: usize,

    #[clap(long, default_value = DEFAULT_INPUT)]
    input_tensor: String,

    #[clap(long, default_value = DEFAULT_OUTPUT)]
    output_tensor: String,
}

pub(super) fn predict(config: Args) -> Result<()> {
    let image_path = config.image_dir.join(&config.img);
    let image = tessel::vis::image::open(&image_path)
        .with_context(|| format!("failed to read {:?}", image_path))?
        .to_rgb8();

    let binding = TensorBinding::new(config.input_tensor, config.output_tensor);
    let driver = InferenceDriver::load(
        &config.model_dir,
        &binding,
        config.batch_size,
        (config.height, config.width),
        config.colormap,
        config.class_num,
    )?;

    log::info!("predicting {:?}", image_path);
    let colored = driver.run(&image)?;

    super::write_png(&colored, &config.output)
}
