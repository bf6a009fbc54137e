use crate::error::{RecordError, Result};
use crate::format::Example;
use tessel_core::normalize_pixels;

/// A parsed example ready for batching.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedExample {
    pub name: String,
    /// `(image_size, image_size, 3)` normalized pixels.
    pub image: Vec<f32>,
    /// `(image_size, image_size, num_classes)` raw label bytes.
    pub mask: Vec<u8>,
}

/// Check payload sizes and normalize the image of `example`.
///
/// # Errors
///
/// [`RecordError::ShapeMismatch`] if either payload disagrees with the
/// declared image size or class count.
pub fn decode_example(
    example: &Example,
    image_size: usize,
    num_classes: usize,
) -> Result<DecodedExample> {
    let pixels = image_size * image_size;

    let expected = pixels * 3;
    if example.image.len() != expected {
        return Err(RecordError::ShapeMismatch {
            field: "image",
            expected,
            actual: example.image.len(),
        });
    }

    let expected = pixels * num_classes;
    if example.mask.len() != expected {
        return Err(RecordError::ShapeMismatch {
            field: "mask",
            expected,
            actual: example.mask.len(),
        });
    }

    Ok(DecodedExample {
        name: example.name.clone(),
        image: normalize_pixels(&example.image),
        mask: example.mask.clone(),
    })
}
