/*!
Single-image segmentation on top of a fixed-batch [`FrozenModel`].
*/

use crate::{
    binding::TensorBinding,
    error::{FrozenError, Result},
    predictor::FrozenModel,
};
use std::path::Path;
use tessel_vis::{
    image::RgbImage, label_map_from_logits, label_map_to_rgb, replicate, resize_linear,
    ColorMap, LabelMap,
};

/// Resizes an image to the model input, replicates it across the batch and
/// colors the argmax of the first batch slot.
pub struct InferenceDriver {
    model: FrozenModel,
    colormap: ColorMap,
    classes: usize,
}

impl InferenceDriver {
    pub fn new(model: FrozenModel, colormap: ColorMap, classes: usize) -> Result<Self> {
        colormap.ensure_covers(classes)?;
        Ok(Self {
            model,
            colormap,
            classes,
        })
    }

    pub fn load(
        path: impl AsRef<Path>,
        binding: &TensorBinding,
        batch_size: usize,
        image_size: (usize, usize),
        colormap: ColorMap,
        classes: usize,
    ) -> Result<Self> {
        colormap.ensure_covers(classes)?;
        let model = FrozenModel::load(path, binding, batch_size, image_size)?;
        Self::new(model, colormap, classes)
    }

    pub fn model(&self) -> &FrozenModel {
        &self.model
    }

    pub fn classes(&self) -> usize {
        self.classes
    }

    /// Per-pixel labels at model resolution.
    pub fn predict_labels(&self, image: &RgbImage) -> Result<LabelMap> {
        let (height, width) = self.model.image_size();
        let batch = self.model.batch_size();

        let resized = resize_linear(image, width as u32, height as u32);
        let scores = self.model.predict_batch(&replicate(&resized, batch))?;

        let per_image = height * width * self.classes;
        let expected = batch * per_image;
        if scores.len() != expected {
            return Err(FrozenError::OutputShapeMismatch {
                expected,
                actual: scores.len(),
            });
        }

        log::info!("decoding {}x{} labels over {} classes", height, width, self.classes);
        Ok(label_map_from_logits(
            &scores[..per_image],
            height,
            width,
            self.classes,
        )?)
    }

    /// Segment `image` and return the colored `(height, width)` label image.
    pub fn run(&self, image: &RgbImage) -> Result<RgbImage> {
        let labels = self.predict_labels(image)?;
        Ok(label_map_to_rgb(&labels, &self.colormap)?)
    }
}
