use anyhow::{bail, Context, Result};
use clap::Parser;
use std::{
    fs,
    io::BufWriter,
    path::{Path, PathBuf},
};
use tessel::records::{Example, RecordWriter};
use tessel::vis::{
    image::{self, imageops::FilterType, GrayImage},
    resize_linear,
};

/// Pack images and label masks into a record file.
///
/// Every image needs a PNG mask with the same file stem whose pixel values
/// are class ids. Ids outside the class range leave the pixel unlabeled.
#[derive(Parser, Debug)]
#[clap()]
pub(crate) struct PackArgs {
    /// Directory of RGB images.
    images: PathBuf,

    /// Directory of single-channel label masks.
    masks: PathBuf,

    /// The record file to write.
    output: PathBuf,

    /// Side length the images and masks are resized to.
    #[clap(long, default_value_t = 256)]
    image_size: usize,

    #[clap(long, default_value_t = 21)]
    class_num: usize,
}

fn one_hot(mask: &GrayImage, classes: usize) -> (Vec<u8>, usize) {
    let mut out = vec![0u8; mask.as_raw().len() * classes];
    let mut unlabeled = 0;

    for (pixel, &label) in mask.as_raw().iter().enumerate() {
        let label = label as usize;
        if label < classes {
            out[pixel * classes + label] = 1;
        } else {
            unlabeled += 1;
        }
    }

    (out, unlabeled)
}

fn load_example(image_path: &Path, mask_dir: &Path, size: u32, classes: usize) -> Result<Example> {
    let Some(stem) = image_path.file_stem() else {
        bail!("image without a file name: {:?}", image_path);
    };
    let mask_path = mask_dir.join(format!("{}.png", stem.to_string_lossy()));

    let image = image::open(image_path)
        .with_context(|| format!("failed to read {:?}", image_path))?
        .to_rgb8();
    let mask = image::open(&mask_path)
        .with_context(|| format!("failed to read mask {:?}", mask_path))?
        .to_luma8();

    let image = resize_linear(&image, size, size);
    let mask = image::imageops::resize(&mask, size, size, FilterType::Nearest);

    let (mask, unlabeled) = one_hot(&mask, classes);
    if unlabeled > 0 {
        log::debug!("{} unlabeled pixels in {:?}", unlabeled, mask_path);
    }

    let name = image_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(Example::new(name, image.into_raw(), mask))
}

pub(super) fn pack(config: PackArgs) -> Result<()> {
    let mut images = fs::read_dir(&config.images)
        .with_context(|| format!("failed to list {:?}", config.images))?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<Vec<_>, _>>()?;
    images.retain(|path| path.is_file());
    images.sort();

    if images.is_empty() {
        bail!("no images in {:?}", config.images);
    }

    let out = tempfile::NamedTempFile::new_in(super::staging_dir(&config.output))?;
    let mut writer = RecordWriter::create(BufWriter::new(out))?;

    for path in &images {
        let example = load_example(
            path,
            &config.masks,
            config.image_size as u32,
            config.class_num,
        )?;
        writer.write(&example)?;
    }

    let count = writer.len();
    let out = writer.finish()?.into_inner()?;
    out.persist(&config.output)?;

    log::info!("packed {} examples into {:?}", count, config.output);
    Ok(())
}
