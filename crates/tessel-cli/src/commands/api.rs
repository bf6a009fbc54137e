use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tessel::frozen::{FrozenModel, TensorBinding, DEFAULT_INPUT, DEFAULT_OUTPUT};

/// Print API for a frozen model
#[derive(Parser, Debug)]
#[clap()]
pub(crate) struct ApiArgs {
    /// A model file (.pb, .onnx, .nnef.tar) or a directory holding one.
    file: PathBuf,

    #[clap(short, long, default_value_t = 1)]
    batch_size: usize,

    #[clap(long, default_value_t = 256)]
    height: usize,

    #[clap(long, default_value_t = 256)]
    width: usize,

    #[clap(long, default_value = DEFAULT_INPUT)]
    input_tensor: String,

    #[clap(long, default_value = DEFAULT_OUTPUT)]
    output_tensor: String,
}

pub(super) fn describe_api(config: ApiArgs) -> Result<()> {
    let binding = TensorBinding::new(config.input_tensor, config.output_tensor);
    let model = FrozenModel::load(
        &config.file,
        &binding,
        config.batch_size,
        (config.height, config.width),
    )?;

    println!("Format: {}", model.artifact().kind);
    println!("\nInputs:");
    for spec in &model.api().inputs {
        println!("\t{:40}: {:?} {:?}", spec.name, spec.shape, spec.datum_type);
    }

    println!("\nOutputs:");
    for spec in &model.api().outputs {
        println!("\t{:40}: {:?} {:?}", spec.name, spec.shape, spec.datum_type);
    }
    Ok(())
}
