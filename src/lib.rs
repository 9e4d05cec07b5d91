//! Photostrip is the image core of a photobooth backend.
//!
//! - [`filter`] turns one captured frame into a 400×400 vintage-treated photo.
//! - [`compose`] arranges filtered photos on a paper strip with a two-line caption.
//! - [`session`] tracks booth sessions and persists photos and strips on disk.
#![forbid(unsafe_code)]

mod foundation;

pub mod blend;
pub mod codec;
pub mod compose;
pub mod config;
pub mod filter;
pub mod session;

pub use crate::codec::{
    PHOTO_JPEG_QUALITY, RawImage, STRIP_JPEG_QUALITY, decode_capture, decode_image, encode_jpeg,
};
pub use crate::compose::{
    CaptionFonts, LayoutSpec, StripComposer, StripGeometry, StripImage, compose_strip,
    compose_strip_jpeg,
};
pub use crate::config::BoothConfig;
pub use crate::filter::{FilteredImage, VintageFilter, apply_filter, filter_capture};
pub use crate::foundation::error::{PhotostripError, PhotostripResult};
pub use crate::session::{
    Booth, NewSession, PhotoRecord, PhotoStore, Session, SessionState, StripOutcome,
};
