use image::{imageops, imageops::FilterType, RgbImage};

/// Bilinear resize to `width x height`. Returns a copy when the size already matches.
pub fn resize_linear(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }

    log::debug!(
        "resizing {:?} to {:?}",
        image.dimensions(),
        (width, height)
    );
    imageops::resize(image, width, height, FilterType::Triangle)
}

/// Copy `image` into `batch` contiguous `(h, w, 3)` slots.
pub fn replicate(image: &RgbImage, batch: usize) -> Vec<u8> {
    let raw = image.as_raw();
    let mut out = Vec::with_capacity(raw.len() * batch);
    for _ in 0..batch {
        out.extend_from_slice(raw);
    }
    out
}
