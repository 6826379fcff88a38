//! Fetches a remote image, corrects its EXIF orientation, resizes it and
//! publishes it as JPEG to an S3-compatible object store.
//!
//! The pipeline lives on [`resizer::ImageHandle`]; object stores plug in
//! through [`storage::ObjectStore`].

pub mod app;
pub mod error;
pub mod models;
pub mod resizer;
pub mod storage;

pub use error::{Error, Result};
