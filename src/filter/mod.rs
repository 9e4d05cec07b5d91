//! Filter Engine: the fixed vintage treatment applied to every captured photo.
//!
//! Stages run in a fixed order on an owned RGB buffer: normalize to RGB, resize to a square,
//! desaturate, brighten, soften, then blend in monochrome grain. Only the grain stage draws
//! randomness; everything before it is a pure function of the input.

pub mod blur;
pub mod grain;
pub mod tone;

use image::{RgbImage, imageops::FilterType};
use rand::Rng;

use crate::{
    PhotostripResult,
    codec::{PHOTO_JPEG_QUALITY, RawImage, decode_capture, encode_jpeg},
};

pub use grain::GrainField;

/// Filtered capture: square RGB with the treatment baked in.
pub type FilteredImage = RgbImage;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VintageFilter {
    pub size: u32,
    pub saturation: f32,
    pub brightness: f32,
    pub blur_sigma: f32,
    pub grain_amplitude: i16,
    pub grain_mix: f32,
}

impl Default for VintageFilter {
    fn default() -> Self {
        Self {
            size: 400,
            saturation: 0.7,
            brightness: 1.1,
            blur_sigma: 0.5,
            grain_amplitude: 10,
            grain_mix: 0.05,
        }
    }
}

impl VintageFilter {
    /// Every stage except grain. Deterministic.
    pub fn develop(&self, image: &RawImage) -> PhotostripResult<RgbImage> {
        let rgb = image.to_rgb8();
        let mut img = image::imageops::resize(&rgb, self.size, self.size, FilterType::Lanczos3);

        tone::adjust_saturation(&mut img, self.saturation);
        tone::adjust_brightness(&mut img, self.brightness);
        blur::gaussian_blur_rgb8(&img, self.blur_sigma)
    }

    pub fn apply_with_rng<R: Rng + ?Sized>(
        &self,
        image: &RawImage,
        rng: &mut R,
    ) -> PhotostripResult<FilteredImage> {
        let mut img = self.develop(image)?;
        let field = GrainField::generate(img.width(), img.height(), self.grain_amplitude, rng);
        grain::blend_grain(&mut img, &field, self.grain_mix)?;
        Ok(img)
    }

    #[tracing::instrument(skip(self, image), fields(src_w = image.width(), src_h = image.height()))]
    pub fn apply(&self, image: &RawImage) -> PhotostripResult<FilteredImage> {
        let out = self.apply_with_rng(image, &mut rand::rng())?;
        tracing::debug!(size = self.size, "vintage filter applied");
        Ok(out)
    }
}

pub fn apply_filter(image: &RawImage) -> PhotostripResult<FilteredImage> {
    VintageFilter::default().apply(image)
}

/// Capture payload (optionally a data URL) to filtered JPEG bytes.
pub fn filter_capture(payload: &str) -> PhotostripResult<Vec<u8>> {
    let raw = decode_capture(payload)?;
    let filtered = apply_filter(&raw)?;
    encode_jpeg(&filtered, PHOTO_JPEG_QUALITY)
}
