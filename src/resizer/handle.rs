use super::exif_tags::ExifTags;
use super::orientation;
use crate::storage::{Acl, ObjectMetadata, ObjectStore, CONTENT_TYPE};
use crate::{Error, Result};
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use tracing::{debug, info};

pub const DEFAULT_QUALITY: u8 = 95;

const RGBA_BYTES_PER_PIXEL: u64 = 4;

/// Options for [`ImageHandle::store`].
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub metadata: ObjectMetadata,
    pub quality: u8,
    pub public: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            metadata: ObjectMetadata::new(),
            quality: DEFAULT_QUALITY,
            public: true,
        }
    }
}

impl StoreOptions {
    pub fn with_metadata(mut self, metadata: ObjectMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_public(mut self, public: bool) -> Self {
        self.public = public;
        self
    }
}

/// A single image moving through fetch, orientate, resize and store.
///
/// `fetch` and `orientate` mutate the handle in place. `resize` leaves it
/// untouched and returns a new handle owning the resized image, bound to the
/// same object store.
pub struct ImageHandle {
    store: Arc<dyn ObjectStore>,
    http: Client,
    image: Option<RgbaImage>,
    exif: ExifTags,
}

impl ImageHandle {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self::with_http_client(store, Client::new())
    }

    pub fn with_http_client(store: Arc<dyn ObjectStore>, http: Client) -> Self {
        Self {
            store,
            http,
            image: None,
            exif: ExifTags::default(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.image.is_some()
    }

    pub fn image(&self) -> Option<&RgbaImage> {
        self.image.as_ref()
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.image.as_ref().map(|img| img.dimensions())
    }

    pub fn exif(&self) -> &ExifTags {
        &self.exif
    }

    fn loaded(&self, operation: &str) -> Result<&RgbaImage> {
        self.image.as_ref().ok_or_else(|| {
            Error::NotReady(format!(
                "No image loaded! You must call fetch() before {}()",
                operation
            ))
        })
    }

    /// Download and decode the image at `url`, replacing any image and EXIF
    /// tags previously held.
    pub async fn fetch(&mut self, url: &str) -> Result<&mut Self> {
        if url.is_empty() {
            return Err(Error::InvalidParameter("No url specified".to_string()));
        }

        debug!("Fetching image at url {}", url);
        let response = self.http.get(url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(Error::CantFetchImage(format!(
                "Failed to load image at url {} (status {})",
                url,
                response.status()
            )));
        }
        let data = response.bytes().await?;

        let decoded = image::load_from_memory(&data)?;
        let exif = ExifTags::from_image_bytes(&data);

        self.image = Some(flatten_on_white(&decoded));
        self.exif = exif;
        Ok(self)
    }

    /// Rotate and/or mirror the image according to its EXIF orientation.
    /// Images without an orientation tag are left as they are.
    ///
    /// # Panics
    ///
    /// Panics if the fetched image carries an orientation outside 1..=8.
    pub fn orientate(&mut self) -> Result<&mut Self> {
        let image = self.loaded("orientate")?;
        debug!("Image has exif tags: {:?}", self.exif);

        let Some(code) = self.exif.orientation else {
            info!("No exif orientation known for this image");
            return Ok(self);
        };

        info!("Applying exif orientation {} to image", code);
        let oriented = orientation::apply(image, code);
        self.image = Some(oriented);
        Ok(self)
    }

    /// Return a new handle holding this image resized to `width` x `height`.
    ///
    /// When only one dimension is given the other follows the aspect ratio.
    /// When both are given they are used verbatim.
    pub fn resize(&self, width: Option<u32>, height: Option<u32>) -> Result<ImageHandle> {
        let width = width.filter(|w| *w > 0);
        let height = height.filter(|h| *h > 0);
        if width.is_none() && height.is_none() {
            return Err(Error::InvalidParameter(
                "One of width or height must be specified".to_string(),
            ));
        }
        let image = self.loaded("resize")?;

        let (cur_width, cur_height) = image.dimensions();
        let (to_width, to_height) = target_dimensions(cur_width, cur_height, width, height);
        check_allocation(to_width, to_height)?;

        info!(
            "Resizing image from ({}, {}) to ({}, {})",
            cur_width, cur_height, to_width, to_height
        );
        let resized = imageops::resize(image, to_width, to_height, FilterType::Lanczos3);

        let mut clone = ImageHandle::with_http_client(Arc::clone(&self.store), self.http.clone());
        clone.image = Some(resized);
        Ok(clone)
    }

    /// Encode the image as JPEG, upload it to `bucket`/`key_name` and return
    /// its public URL.
    pub async fn store(
        &self,
        bucket: &str,
        key_name: &str,
        options: StoreOptions,
    ) -> Result<String> {
        if bucket.is_empty() {
            return Err(Error::InvalidParameter("No bucket specified".to_string()));
        }
        if key_name.is_empty() {
            return Err(Error::InvalidParameter("No key_name specified".to_string()));
        }
        if !(1..=100).contains(&options.quality) {
            return Err(Error::InvalidParameter(format!(
                "JPEG quality must be within 1..=100, got {}",
                options.quality
            )));
        }
        let image = self.loaded("store")?;

        let metadata = with_jpeg_content_type(options.metadata);

        info!("Storing image into bucket {}/{}", bucket, key_name);
        let contents = encode_jpeg(image.clone(), options.quality).await?;

        self.store.check_bucket(bucket).await?;
        self.store
            .put_object(bucket, key_name, contents, &metadata)
            .await?;
        if options.public {
            self.store.set_acl(bucket, key_name, Acl::PublicRead).await?;
        }

        self.store.object_url(bucket, key_name)
    }
}

/// Composite onto an opaque white canvas so transparent pixels come out white
/// once the alpha channel is dropped.
fn flatten_on_white(image: &DynamicImage) -> RgbaImage {
    let rgba = image.to_rgba8();
    let mut canvas = RgbaImage::from_pixel(rgba.width(), rgba.height(), Rgba([255, 255, 255, 255]));
    imageops::overlay(&mut canvas, &rgba, 0, 0);
    canvas
}

fn target_dimensions(
    cur_width: u32,
    cur_height: u32,
    width: Option<u32>,
    height: Option<u32>,
) -> (u32, u32) {
    let scaled = |dim: u32, num: u32, den: u32| -> u32 {
        let value = u64::from(dim) * u64::from(num) / u64::from(den);
        u32::try_from(value).unwrap_or(u32::MAX).max(1)
    };

    match (width, height) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (w, scaled(cur_height, w, cur_width)),
        (None, Some(h)) => (scaled(cur_width, h, cur_height), h),
        (None, None) => (cur_width, cur_height),
    }
}

/// Reject target sizes whose pixel buffer would exceed the `image` crate's
/// default allocation limit.
fn check_allocation(width: u32, height: u32) -> Result<()> {
    let max_alloc = image::Limits::default().max_alloc.unwrap_or(u64::MAX);
    let needed = u64::from(width)
        .checked_mul(u64::from(height))
        .and_then(|pixels| pixels.checked_mul(RGBA_BYTES_PER_PIXEL));

    match needed {
        Some(bytes) if bytes <= max_alloc => Ok(()),
        _ => Err(Error::InvalidParameter(format!(
            "Target size {}x{} exceeds the {} byte image allocation limit",
            width, height, max_alloc
        ))),
    }
}

fn with_jpeg_content_type(mut metadata: ObjectMetadata) -> ObjectMetadata {
    metadata.retain(|name, _| !name.eq_ignore_ascii_case(CONTENT_TYPE));
    metadata.insert(CONTENT_TYPE.to_string(), "image/jpeg".to_string());
    metadata
}

fn encode_jpeg_with(image: RgbaImage, quality: u8, optimize: bool) -> Result<Vec<u8>> {
    let too_large = || {
        Error::InvalidParameter(format!(
            "Image {}x{} is too large for JPEG",
            image.width(),
            image.height()
        ))
    };
    let width = u16::try_from(image.width()).map_err(|_| too_large())?;
    let height = u16::try_from(image.height()).map_err(|_| too_large())?;

    let rgb = DynamicImage::ImageRgba8(image).to_rgb8();
    let mut contents = Vec::new();
    let mut encoder = jpeg_encoder::Encoder::new(&mut contents, quality);
    encoder.set_optimized_huffman_tables(optimize);
    encoder.encode(rgb.as_raw(), width, height, jpeg_encoder::ColorType::Rgb)?;
    Ok(contents)
}

fn encode_jpeg_sync(image: RgbaImage, quality: u8) -> Result<Vec<u8>> {
    encode_jpeg_with(image, quality, true)
}

async fn encode_jpeg(image: RgbaImage, quality: u8) -> Result<Vec<u8>> {
    tokio::task::spawn_blocking(move || encode_jpeg_sync(image, quality))
        .await
        .map_err(|e| Error::Invariant(format!("JPEG encoding task join error: {}", e)))?
}
