//! Application orchestration for resizing and publishing a single image.

use crate::models::{Config, ResizeJob, StoredImage};
use crate::resizer::{ImageHandle, StoreOptions};
use crate::storage::{MockObjectStore, ObjectStore, S3Store};
use crate::{Error, Result};
use std::sync::Arc;
use tracing::info;

/// Runs resize jobs against one object store session.
pub struct App {
    store: Arc<dyn ObjectStore>,
    http: reqwest::Client,
}

impl App {
    /// Build an app around an already constructed store.
    ///
    /// This is primarily useful for integration tests and local harnesses that
    /// need to inject mocks.
    pub fn with_store(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            http: reqwest::Client::new(),
        }
    }

    /// Construct an app from environment configuration (`Config::from_env`).
    pub async fn new() -> Result<Self> {
        Self::from_config(Config::from_env()?).await
    }

    pub async fn from_config(config: Config) -> Result<Self> {
        let store: Arc<dyn ObjectStore> = if config.dry_run {
            info!("DRY_RUN enabled, uploads will be kept in memory");
            Arc::new(MockObjectStore::new())
        } else {
            let missing = |name: &str| Error::Config(format!("{} not set", name));
            Arc::new(
                S3Store::new(
                    config
                        .s3_access_key_id
                        .clone()
                        .ok_or_else(|| missing("S3_ACCESS_KEY_ID"))?,
                    config
                        .s3_secret_access_key
                        .clone()
                        .ok_or_else(|| missing("S3_SECRET_ACCESS_KEY"))?,
                    config.s3_endpoint.clone(),
                    config.s3_region.clone(),
                )
                .await?,
            )
        };

        Ok(Self::with_store(store))
    }

    /// Fetch, orientate, resize and store the image described by `job`.
    pub async fn run(&self, job: ResizeJob) -> Result<StoredImage> {
        let mut handle = ImageHandle::with_http_client(Arc::clone(&self.store), self.http.clone());
        handle.fetch(&job.url).await?;
        if job.orientate {
            handle.orientate()?;
        }

        let resized = handle.resize(job.width, job.height)?;
        let (width, height) = resized
            .dimensions()
            .ok_or_else(|| Error::Invariant("Resized handle holds no image".to_string()))?;

        let options = StoreOptions::default()
            .with_metadata(job.metadata)
            .with_quality(job.quality)
            .with_public(job.public);
        let url = resized.store(&job.bucket, &job.key, options).await?;
        info!("Stored {}x{} image at {}", width, height, url);

        Ok(StoredImage { url, width, height })
    }
}
