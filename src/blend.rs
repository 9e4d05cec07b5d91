//! Per-channel blending shared by the filter and the strip composer.

use image::{Rgb, RgbImage};

use crate::{PhotostripError, PhotostripResult};

/// `a + t * (b - a)`, clipped to the u8 range and truncated toward zero.
///
/// `t` outside `[0, 1]` extrapolates, which is how the enhancement steps scale chroma and
/// luminance.
pub fn mix(a: f32, b: f32, t: f32) -> u8 {
    let v = a + t * (b - a);
    if v <= 0.0 {
        0
    } else if v >= 255.0 {
        255
    } else {
        v as u8
    }
}

pub fn mix_rgb(a: Rgb<u8>, b: Rgb<u8>, t: f32) -> Rgb<u8> {
    let mut out = [0u8; 3];
    for i in 0..3 {
        out[i] = mix(f32::from(a[i]), f32::from(b[i]), t);
    }
    Rgb(out)
}

/// Blends every pixel of `img` toward the matching pixel of `other`.
pub fn mix_images_in_place(img: &mut RgbImage, other: &RgbImage, t: f32) -> PhotostripResult<()> {
    if img.dimensions() != other.dimensions() {
        return Err(PhotostripError::validation(
            "mix_images_in_place expects equal-size rgb images",
        ));
    }
    for (d, s) in img.pixels_mut().zip(other.pixels()) {
        *d = mix_rgb(*d, *s, t);
    }
    Ok(())
}

/// Source-over of a premultiplied RGBA8 pixel onto an opaque RGB pixel.
pub fn over_opaque(dst: Rgb<u8>, src: [u8; 4]) -> Rgb<u8> {
    let sa = src[3];
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return Rgb([src[0], src[1], src[2]]);
    }

    let inv = 255u16 - u16::from(sa);
    let mut out = [0u8; 3];
    for i in 0..3 {
        out[i] = src[i].saturating_add(mul_div255(u16::from(dst[i]), inv));
    }
    Rgb(out)
}

/// Composites a premultiplied RGBA8 layer onto `dst` with its top-left corner at `(x, y)`.
/// Pixels falling outside `dst` are dropped.
pub fn over_layer_in_place(
    dst: &mut RgbImage,
    layer: &[u8],
    layer_width: u32,
    layer_height: u32,
    x: u32,
    y: u32,
) -> PhotostripResult<()> {
    let expected_len = (layer_width as usize)
        .checked_mul(layer_height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| PhotostripError::validation("layer buffer size overflow"))?;
    if layer.len() != expected_len {
        return Err(PhotostripError::validation(
            "over_layer_in_place expects layer matching width*height*4",
        ));
    }

    for ly in 0..layer_height {
        let dy = y + ly;
        if dy >= dst.height() {
            break;
        }
        for lx in 0..layer_width {
            let dx = x + lx;
            if dx >= dst.width() {
                break;
            }
            let idx = ((ly * layer_width + lx) as usize) * 4;
            let src = [layer[idx], layer[idx + 1], layer[idx + 2], layer[idx + 3]];
            let px = dst.get_pixel_mut(dx, dy);
            *px = over_opaque(*px, src);
        }
    }
    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mix_endpoints() {
        assert_eq!(mix(10.0, 200.0, 0.0), 10);
        assert_eq!(mix(10.0, 200.0, 1.0), 200);
    }

    #[test]
    fn mix_truncates_and_clips() {
        assert_eq!(mix(245.0, 240.0, 0.1), 244);
        assert_eq!(mix(0.0, 240.0, 1.1), 255);
        assert_eq!(mix(5.0, -10.0, 1.0), 0);
    }

    #[test]
    fn over_alpha_0_is_noop_and_opaque_replaces() {
        let dst = Rgb([1, 2, 3]);
        assert_eq!(over_opaque(dst, [200, 200, 200, 0]), dst);
        assert_eq!(over_opaque(dst, [9, 8, 7, 255]), Rgb([9, 8, 7]));
    }

    #[test]
    fn over_half_alpha_mixes() {
        let out = over_opaque(Rgb([255, 255, 255]), [50, 50, 50, 128]);
        assert_eq!(out, Rgb([50 + 127, 50 + 127, 50 + 127]));
    }

    #[test]
    fn layer_clips_at_canvas_edges() {
        let mut dst = RgbImage::from_pixel(2, 2, Rgb([0, 0, 0]));
        let layer = [255u8, 255, 255, 255].repeat(9);
        over_layer_in_place(&mut dst, &layer, 3, 3, 1, 1).unwrap();
        assert_eq!(*dst.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(*dst.get_pixel(1, 1), Rgb([255, 255, 255]));
    }

    #[test]
    fn layer_size_mismatch_is_rejected() {
        let mut dst = RgbImage::new(2, 2);
        assert!(over_layer_in_place(&mut dst, &[0u8; 7], 1, 2, 0, 0).is_err());
    }
}
