use image::{Rgb, RgbImage};

use crate::blend::mix;

/// ITU-R 601 luma in 16.16 fixed point, rounded.
pub fn luma(px: Rgb<u8>) -> u8 {
    let [r, g, b] = px.0;
    let l = u32::from(r) * 19595 + u32::from(g) * 38470 + u32::from(b) * 7471 + 0x8000;
    (l >> 16) as u8
}

/// Scales chroma around each pixel's luma: `0.0` is greyscale, `1.0` is the input.
pub fn adjust_saturation(img: &mut RgbImage, factor: f32) {
    for px in img.pixels_mut() {
        let l = f32::from(luma(*px));
        for c in 0..3 {
            px[c] = mix(l, f32::from(px[c]), factor);
        }
    }
}

/// Scales every channel toward or away from black, clipping at 255.
pub fn adjust_brightness(img: &mut RgbImage, factor: f32) {
    for px in img.pixels_mut() {
        for c in 0..3 {
            px[c] = mix(0.0, f32::from(px[c]), factor);
        }
    }
}
