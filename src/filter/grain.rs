use image::RgbImage;
use rand::Rng;

use crate::{PhotostripError, PhotostripResult, blend::mix};

/// Monochrome noise: one signed sample per pixel, shared by R, G and B.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrainField {
    pub width: u32,
    pub height: u32,
    pub samples: Vec<i16>,
}

impl GrainField {
    /// Draws every sample uniformly from the integers in `[-amplitude, amplitude]`.
    pub fn generate<R: Rng + ?Sized>(width: u32, height: u32, amplitude: i16, rng: &mut R) -> Self {
        let amplitude = amplitude.abs();
        let samples = (0..(width as usize) * (height as usize))
            .map(|_| rng.random_range(-amplitude..=amplitude))
            .collect();
        Self {
            width,
            height,
            samples,
        }
    }
}

/// Linear blend of `img` with the grain field: `out = px + mix * (noise - px)`.
pub fn blend_grain(img: &mut RgbImage, grain: &GrainField, mix_t: f32) -> PhotostripResult<()> {
    if img.dimensions() != (grain.width, grain.height) {
        return Err(PhotostripError::validation(format!(
            "grain field is {}x{}, image is {}x{}",
            grain.width,
            grain.height,
            img.width(),
            img.height()
        )));
    }
    for (px, &n) in img.pixels_mut().zip(&grain.samples) {
        let n = f32::from(n);
        for c in 0..3 {
            px[c] = mix(f32::from(px[c]), n, mix_t);
        }
    }
    Ok(())
}
