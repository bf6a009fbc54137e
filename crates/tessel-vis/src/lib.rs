/*!

# Tessel Vis

Turns per-pixel class scores into label maps and colored images.

 */

#![warn(rust_2018_idioms)]

pub use image;

mod colormap;
mod error;
mod labels;
mod resize;

pub use colormap::{label_map_to_rgb, ColorMap, UAVID, VOC};
pub use error::{Result, VisError};
pub use labels::{label_map_from_logits, LabelMap};
pub use resize::{replicate, resize_linear};

/// Argmax `scores` and color the result in one step.
pub fn decode_labels(
    scores: &[f32],
    height: usize,
    width: usize,
    classes: usize,
    colormap: &ColorMap,
) -> Result<image::RgbImage> {
    colormap.ensure_covers(classes)?;
    let map = label_map_from_logits(scores, height, width, classes)?;
    label_map_to_rgb(&map, colormap)
}
