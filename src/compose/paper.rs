use image::{Rgb, RgbImage};

use crate::{PhotostripResult, blend::mix_images_in_place};

pub const PAPER_BASE: Rgb<u8> = Rgb([255, 248, 245]);
pub const PAPER_TINT: Rgb<u8> = Rgb([255, 248, 240]);
pub const PAPER_TINT_MIX: f32 = 0.1;

/// Warm off-white strip background: the base tone pulled 10% toward a warmer tint.
pub fn paper_canvas(width: u32, height: u32) -> PhotostripResult<RgbImage> {
    let mut canvas = RgbImage::from_pixel(width, height, PAPER_BASE);
    let overlay = RgbImage::from_pixel(width, height, PAPER_TINT);
    mix_images_in_place(&mut canvas, &overlay, PAPER_TINT_MIX)?;
    Ok(canvas)
}
