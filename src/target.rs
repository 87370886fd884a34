use std::path::Path;

use image::{imageops, RgbaImage};

/// the image a run is trying to approximate. owns the full-resolution pixels;
/// reference buffers are resampled from it once per run.
#[derive(Clone)]
pub struct TargetImage {
    image: RgbaImage,
}

impl TargetImage {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, image::ImageError> {
        let image = image::open(path)?.to_rgba8();
        Ok(Self { image })
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// resample to a square `resolution × resolution` straight-RGBA buffer.
    /// read-only for the remainder of the run that requested it.
    pub fn reference_buffer(&self, resolution: u32) -> Vec<u8> {
        profiling::scope!("reference_buffer");
        if self.image.dimensions() == (resolution, resolution) {
            return self.image.as_raw().clone();
        }
        imageops::resize(&self.image, resolution, resolution, imageops::FilterType::CatmullRom).into_raw()
    }
}
