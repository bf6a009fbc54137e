// Author: Tessel Developers
// Copyright © 2026, Tessel Developers, all rights reserved.
// Created: 16 October 2026

/*!
Subcommands of the `tessel` binary.
*/

use anyhow::Result;
use clap::Parser;
use std::{
    io::{Cursor, Write},
    path::Path,
};
use tessel::vis::image::{ImageFormat, RgbImage};

mod api;
mod checkpoint_predict;
mod pack;
mod predict;
mod stream;

/// The command to run.
#[derive(Parser, Debug)]
pub(crate) enum Command {
    Predict(predict::Args),
    CheckpointPredict(checkpoint_predict::Args),
    Stream(stream::Args),
    Api(api::ApiArgs),
    Pack(pack::PackArgs),
}

pub(crate) fn run(command: Command) -> Result<()> {
    match command {
        Command::Predict(config) => predict::predict(config),
        Command::CheckpointPredict(config) => checkpoint_predict::predict(config),
        Command::Stream(config) => stream::stream(config),
        Command::Api(config) => api::describe_api(config),
        Command::Pack(config) => pack::pack(config),
    }
}

/// Directory a new file next to `path` should be staged in.
fn staging_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Encode `image` as PNG and move it over `output` once fully written.
fn write_png(image: &RgbImage, output: &Path) -> Result<()> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;

    let mut out = tempfile::NamedTempFile::new_in(staging_dir(output))?;
    out.write_all(&bytes)?;
    out.persist(output)?;

    log::info!("wrote {}x{} image to {:?}", image.width(), image.height(), output);
    Ok(())
}
