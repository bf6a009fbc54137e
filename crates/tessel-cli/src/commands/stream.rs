use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tessel::records::{BatchPipeline, PipelineConfig};

/// Pull batches from a record file and print what comes out.
#[derive(Parser, Debug)]
#[clap()]
pub(crate) struct Args {
    /// The record file to read.
    file: PathBuf,

    #[clap(short, long, default_value_t = 8)]
    batch_size: usize,

    /// Side length of the square images in the records.
    #[clap(long, default_value_t = 256)]
    image_size: usize,

    #[clap(long, default_value_t = 21)]
    class_num: usize,

    /// Maximum number of decoded examples buffered for shuffling.
    #[clap(long, default_value_t = 32)]
    capacity: usize,

    #[clap(long, default_value_t = 0)]
    min_after_dequeue: usize,

    /// Number of reader threads.
    #[clap(long, default_value_t = 4)]
    threads: usize,

    #[clap(short, long, default_value_t = 1)]
    epochs: usize,

    #[clap(short, long, default_value_t = 10)]
    iterations_per_epoch: usize,

    /// Fix the shuffle order.
    #[clap(long)]
    seed: Option<u64>,
}

pub(super) fn stream(config: Args) -> Result<()> {
    let pipeline = BatchPipeline::spawn(
        &config.file,
        PipelineConfig {
            batch_size: config.batch_size,
            image_size: config.image_size,
            num_classes: config.class_num,
            capacity: config.capacity,
            min_after_dequeue: config.min_after_dequeue,
            threads: config.threads,
            epochs: Some(config.epochs),
            seed: config.seed,
        },
    )?;

    'epochs: for epoch in 1..=config.epochs {
        for iteration in 1..=config.iterations_per_epoch {
            if pipeline.should_stop() {
                break 'epochs;
            }

            let batch = match pipeline.next_batch() {
                Ok(batch) => batch,
                Err(err) if err.is_exhausted() => {
                    log::info!("epoch limit reached");
                    break 'epochs;
                }
                Err(err) => return Err(err.into()),
            };

            println!(
                "{}/{} epochs; {}/{}:\n\tnames: {:?}\n\timages: {:?}\n\tmasks: {:?}",
                epoch,
                config.epochs,
                iteration,
                config.iterations_per_epoch,
                batch.names,
                batch.image_shape(),
                batch.mask_shape()
            );
        }
    }

    log::info!("requesting stop");
    pipeline.shutdown()?;
    Ok(())
}
