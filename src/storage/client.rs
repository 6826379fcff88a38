use super::{path_style_url, Acl, ObjectMetadata, ObjectStore, CONTENT_TYPE};
use crate::{Error, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::{config::Region, types::ObjectCannedAcl, Client as S3Client};

pub struct S3Store {
    client: S3Client,
    /// `host[:port]` of the endpoint, used for public URLs.
    host: String,
}

impl S3Store {
    pub async fn new(
        access_key_id: String,
        secret_access_key: String,
        endpoint: String,
        region: String,
    ) -> Result<Self> {
        let host = endpoint_host(&endpoint)?;

        let credentials = aws_sdk_s3::config::Credentials::new(
            access_key_id,
            secret_access_key,
            None,
            None,
            "s3-image-resizer",
        );

        let config = aws_config::defaults(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new(region))
            .endpoint_url(endpoint)
            .load()
            .await;

        // Path-style addressing so object URLs are <host>/<bucket>/<key>
        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: S3Client::from_conf(s3_config),
            host,
        })
    }
}

fn endpoint_host(endpoint: &str) -> Result<String> {
    let url = reqwest::Url::parse(endpoint).map_err(|e| {
        Error::InvalidParameter(format!("Invalid S3 endpoint '{}': {}", endpoint, e))
    })?;
    let host = url.host_str().ok_or_else(|| {
        Error::InvalidParameter(format!("S3 endpoint '{}' has no host", endpoint))
    })?;

    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn check_bucket(&self, bucket: &str) -> Result<()> {
        self.client
            .head_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| Error::Storage(format!("Bucket '{}' is not available: {}", bucket, e)))?;
        Ok(())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        metadata: &ObjectMetadata,
    ) -> Result<()> {
        let mut request = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(data));

        for (name, value) in metadata {
            if name.eq_ignore_ascii_case(CONTENT_TYPE) {
                request = request.content_type(value);
            } else {
                request = request.metadata(name, value);
            }
        }

        request
            .send()
            .await
            .map_err(|e| Error::Storage(format!("Failed to upload {}/{}: {}", bucket, key, e)))?;
        Ok(())
    }

    async fn set_acl(&self, bucket: &str, key: &str, acl: Acl) -> Result<()> {
        let canned = match acl {
            Acl::Private => ObjectCannedAcl::Private,
            Acl::PublicRead => ObjectCannedAcl::PublicRead,
        };

        self.client
            .put_object_acl()
            .bucket(bucket)
            .key(key)
            .acl(canned)
            .send()
            .await
            .map_err(|e| {
                Error::Storage(format!("Failed to set ACL on {}/{}: {}", bucket, key, e))
            })?;
        Ok(())
    }

    fn object_url(&self, bucket: &str, key: &str) -> Result<String> {
        path_style_url(&self.host, bucket, key)
    }
}
