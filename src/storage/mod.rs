//! Object store integration for publishing resized images
//!
//! Handles uploading encoded images to S3-compatible storage, setting their
//! access policy and producing the public URL they are served from.

pub mod client;
pub mod mock;

pub use client::S3Store;
pub use mock::MockObjectStore;

use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Metadata attached to a stored object. A `Content-Type` entry is sent as the
/// object's content type, everything else as user metadata.
pub type ObjectMetadata = HashMap<String, String>;

pub const CONTENT_TYPE: &str = "Content-Type";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acl {
    Private,
    PublicRead,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fails if `bucket` does not exist or is not reachable with this session.
    async fn check_bucket(&self, bucket: &str) -> Result<()>;
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        metadata: &ObjectMetadata,
    ) -> Result<()>;
    async fn set_acl(&self, bucket: &str, key: &str, acl: Acl) -> Result<()>;
    /// Unsigned, non-expiring plain HTTP URL of an object.
    fn object_url(&self, bucket: &str, key: &str) -> Result<String>;
}

/// Build `http://<host>/<bucket>/<key>` with each path segment escaped.
pub(crate) fn path_style_url(host: &str, bucket: &str, key: &str) -> Result<String> {
    let mut url = reqwest::Url::parse(&format!("http://{}", host))
        .map_err(|e| crate::Error::InvalidParameter(format!("Invalid host '{}': {}", host, e)))?;
    url.path_segments_mut()
        .map_err(|_| crate::Error::InvalidParameter(format!("Invalid host '{}'", host)))?
        .clear()
        .push(bucket)
        .extend(key.split('/'));
    Ok(url.to_string())
}
