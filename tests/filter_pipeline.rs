use std::io::Cursor;

use base64::Engine as _;
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use photostrip::{
    PHOTO_JPEG_QUALITY, PhotostripError, VintageFilter, apply_filter, decode_image, encode_jpeg,
    filter_capture,
};
use rand::SeedableRng as _;
use rand::rngs::StdRng;

fn png(img: DynamicImage) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn gradient(w: u32, h: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
        Rgb([(x * 255 / w) as u8, (y * 255 / h) as u8, 90])
    }))
}

#[test]
fn any_source_becomes_400_square_rgb_jpeg() {
    let sources = [
        gradient(1280, 720),
        gradient(9, 640),
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(300, 300, Rgba([20, 200, 20, 40]))),
        DynamicImage::ImageLuma8(image::GrayImage::from_pixel(50, 50, image::Luma([200]))),
    ];
    for src in &sources {
        let out = apply_filter(src).unwrap();
        assert_eq!(out.dimensions(), (400, 400));

        let jpeg = encode_jpeg(&out, PHOTO_JPEG_QUALITY).unwrap();
        let back = decode_image(&jpeg).unwrap();
        assert_eq!((back.width(), back.height()), (400, 400));
        assert_eq!(back.color(), image::ColorType::Rgb8);
    }
}

#[test]
fn grain_deviation_on_solid_input_is_bounded() {
    let src = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 64, Rgb([100, 100, 100])));
    let filter = VintageFilter::default();

    let pre_grain = filter.develop(&src).unwrap();
    let out = filter
        .apply_with_rng(&src, &mut StdRng::seed_from_u64(2024))
        .unwrap();

    let total: u64 = pre_grain
        .as_raw()
        .iter()
        .zip(out.as_raw())
        .map(|(&a, &b)| u64::from(a.abs_diff(b)))
        .sum();
    let mean = total as f64 / pre_grain.as_raw().len() as f64;

    // 5% of the distance between a ~110 pixel and noise in [-10, 10].
    assert!(mean <= 0.05 * 255.0, "mean deviation {mean}");
    assert!(mean >= 3.0, "mean deviation {mean}");
}

#[test]
fn grain_is_the_only_random_stage() {
    let src = gradient(120, 80);
    let filter = VintageFilter::default();
    let a = filter
        .apply_with_rng(&src, &mut StdRng::seed_from_u64(1))
        .unwrap();
    let b = filter
        .apply_with_rng(&src, &mut StdRng::seed_from_u64(2))
        .unwrap();
    assert_ne!(a, b);

    let max_delta = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .map(|(&x, &y)| x.abs_diff(y))
        .max()
        .unwrap();
    assert!(max_delta <= 2, "max delta {max_delta}");
}

#[test]
fn filter_capture_accepts_data_urls() {
    let b64 = base64::engine::general_purpose::STANDARD.encode(png(gradient(64, 48)));

    let jpeg = filter_capture(&format!("data:image/png;base64,{b64}")).unwrap();
    let back = decode_image(&jpeg).unwrap();
    assert_eq!((back.width(), back.height()), (400, 400));

    let jpeg = filter_capture(&b64).unwrap();
    assert_eq!(decode_image(&jpeg).unwrap().width(), 400);
}

#[test]
fn undecodable_capture_is_decode_error() {
    let b64 = base64::engine::general_purpose::STANDARD.encode(b"not an image at all");
    let err = filter_capture(&format!("data:image/jpeg;base64,{b64}")).unwrap_err();
    assert!(matches!(err, PhotostripError::Decode { .. }));
}
