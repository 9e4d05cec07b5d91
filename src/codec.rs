use anyhow::Context as _;
use base64::Engine as _;
use image::{ImageEncoder as _, RgbImage};

use crate::{PhotostripError, PhotostripResult};

/// Decoded capture of arbitrary size and color mode. Lives only inside a processing call.
pub type RawImage = image::DynamicImage;

pub const PHOTO_JPEG_QUALITY: u8 = 90;
pub const STRIP_JPEG_QUALITY: u8 = 95;

/// Drops a `data:<mime>;base64,` header if present.
pub fn strip_data_url(payload: &str) -> &str {
    match payload.split_once(',') {
        Some((_, body)) => body,
        None => payload,
    }
}

pub fn decode_capture(payload: &str) -> PhotostripResult<RawImage> {
    let body = strip_data_url(payload).trim();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(body)
        .map_err(|e| PhotostripError::decode("capture payload is not valid base64", e))?;
    decode_image(&bytes)
}

pub fn decode_image(bytes: &[u8]) -> PhotostripResult<RawImage> {
    image::load_from_memory(bytes)
        .map_err(|e| PhotostripError::decode("decode image from memory", e))
}

pub fn encode_jpeg(img: &RgbImage, quality: u8) -> PhotostripResult<Vec<u8>> {
    let mut buf = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
    encoder
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgb8,
        )
        .with_context(|| format!("encode {}x{} jpeg (q{quality})", img.width(), img.height()))?;
    Ok(buf)
}
