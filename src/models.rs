//! Data models and configuration
//!
//! Defines the job description run by the app, the report it produces and
//! the environment-driven configuration of the object store.

use crate::resizer::DEFAULT_QUALITY;
use crate::storage::ObjectMetadata;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One image to fetch, resize and publish.
#[derive(Debug, Clone)]
pub struct ResizeJob {
    pub url: String,
    pub bucket: String,
    pub key: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: u8,
    pub public: bool,
    pub metadata: ObjectMetadata,
    pub orientate: bool,
}

impl ResizeJob {
    pub fn new(url: String, bucket: String, key: String) -> Self {
        Self {
            url,
            bucket,
            key,
            width: None,
            height: None,
            quality: DEFAULT_QUALITY,
            public: true,
            metadata: ObjectMetadata::new(),
            orientate: true,
        }
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }
}

/// Where a processed image ended up.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredImage {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

impl StoredImage {
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub s3_access_key_id: Option<String>,
    pub s3_secret_access_key: Option<String>,
    pub s3_endpoint: String,
    pub s3_region: String,
    pub dry_run: bool,
}

impl Config {
    /// Load `.env` if there is one, then read the process environment.
    pub fn from_env() -> crate::Result<Self> {
        load_dotenv(dotenvy::dotenv())?;
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`Config::from_env`] with an explicit env file, which must exist.
    pub fn from_env_file(path: &Path) -> crate::Result<Self> {
        let contents = std::fs::read(path)?;
        dotenvy::from_read(contents.as_slice())?;
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> crate::Result<Self> {
        let dry_run = lookup("DRY_RUN")
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let s3_access_key_id = lookup("S3_ACCESS_KEY_ID");
        let s3_secret_access_key = lookup("S3_SECRET_ACCESS_KEY");
        if !dry_run {
            if s3_access_key_id.is_none() {
                return Err(crate::Error::Config("S3_ACCESS_KEY_ID not set".to_string()));
            }
            if s3_secret_access_key.is_none() {
                return Err(crate::Error::Config(
                    "S3_SECRET_ACCESS_KEY not set".to_string(),
                ));
            }
        }

        Ok(Self {
            s3_access_key_id,
            s3_secret_access_key,
            s3_endpoint: lookup("S3_ENDPOINT")
                .unwrap_or_else(|| "https://s3.amazonaws.com".to_string()),
            s3_region: lookup("S3_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            dry_run,
        })
    }
}

/// A missing `.env` is fine, a malformed one is not.
fn load_dotenv(result: dotenvy::Result<PathBuf>) -> crate::Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e.into()),
    }
}
