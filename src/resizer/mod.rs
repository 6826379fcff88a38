//! Image fetching, orientation correction and resizing
//!
//! An [`ImageHandle`] downloads an image, flattens it onto white, applies its
//! EXIF orientation, resizes it and publishes it as JPEG to an object store.

pub mod exif_tags;
pub mod handle;
pub mod orientation;

pub use exif_tags::ExifTags;
pub use handle::{ImageHandle, StoreOptions, DEFAULT_QUALITY};
