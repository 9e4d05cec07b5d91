//! Strip Composer: places filtered photos on a paper canvas and bakes in the caption.

pub mod caption;
pub mod layout;
pub mod paper;

use chrono::NaiveDate;
use image::{RgbImage, imageops::FilterType};

use crate::{
    PhotostripError, PhotostripResult,
    codec::{STRIP_JPEG_QUALITY, decode_image, encode_jpeg},
    filter::FilteredImage,
};

pub use caption::{CaptionFonts, CaptionLayout, LineExtent};
pub use layout::{LayoutSpec, Slot, StripGeometry};

/// Finished strip: photos, paper background and caption.
pub type StripImage = RgbImage;

#[derive(Clone, Debug, Default)]
pub struct StripComposer {
    fonts: CaptionFonts,
}

impl StripComposer {
    pub fn new(fonts: CaptionFonts) -> Self {
        Self { fonts }
    }

    pub fn fonts(&self) -> &CaptionFonts {
        &self.fonts
    }

    /// Composes with today's local date in the caption.
    pub fn compose(
        &self,
        photos: &[FilteredImage],
        layout: &LayoutSpec,
    ) -> PhotostripResult<StripImage> {
        self.compose_on(photos, layout, chrono::Local::now().date_naive())
    }

    #[tracing::instrument(
        skip(self, photos, layout),
        fields(photo_count = layout.photo_count, layout_name = %layout.layout_name)
    )]
    pub fn compose_on(
        &self,
        photos: &[FilteredImage],
        layout: &LayoutSpec,
        date: NaiveDate,
    ) -> PhotostripResult<StripImage> {
        if photos.len() != layout.photo_count as usize {
            return Err(PhotostripError::layout_mismatch(format!(
                "layout '{}' takes {} photos, got {}",
                layout.layout_name,
                layout.photo_count,
                photos.len()
            )));
        }
        let geometry = layout.geometry()?;

        let (width, height) = (geometry.canvas_width(), geometry.canvas_height());
        let mut strip = paper::paper_canvas(width, height)?;

        for (photo, slot) in photos.iter().zip(geometry.slots()) {
            let resized =
                image::imageops::resize(photo, slot.width, slot.height, FilterType::Lanczos3);
            image::imageops::replace(&mut strip, &resized, i64::from(slot.x), i64::from(slot.y));
        }

        let caption = CaptionLayout::new(width, height, &layout.layout_name, date);
        caption::render_caption(&mut strip, &caption, &self.fonts)?;

        tracing::debug!(width, height, "strip composed");
        Ok(strip)
    }

    /// Decodes persisted photo blobs (ascending photo index), composes, and encodes the strip.
    pub fn compose_jpeg(
        &self,
        photo_blobs: &[Vec<u8>],
        layout: &LayoutSpec,
    ) -> PhotostripResult<Vec<u8>> {
        if photo_blobs.len() != layout.photo_count as usize {
            return Err(PhotostripError::layout_mismatch(format!(
                "layout '{}' takes {} photos, got {}",
                layout.layout_name,
                layout.photo_count,
                photo_blobs.len()
            )));
        }
        let photos = photo_blobs
            .iter()
            .map(|blob| decode_image(blob).map(|img| img.to_rgb8()))
            .collect::<PhotostripResult<Vec<_>>>()?;
        let strip = self.compose(&photos, layout)?;
        encode_jpeg(&strip, STRIP_JPEG_QUALITY)
    }
}

/// Composes with [`CaptionFonts::shared_default`]. The first call in a process pays for
/// scanning system fonts.
pub fn compose_strip(photos: &[FilteredImage], layout: &LayoutSpec) -> PhotostripResult<StripImage> {
    StripComposer::default().compose(photos, layout)
}

/// [`compose_strip`] followed by JPEG encoding at [`STRIP_JPEG_QUALITY`].
pub fn compose_strip_jpeg(photo_blobs: &[Vec<u8>], layout: &LayoutSpec) -> PhotostripResult<Vec<u8>> {
    StripComposer::default().compose_jpeg(photo_blobs, layout)
}
