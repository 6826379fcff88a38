use super::{path_style_url, Acl, ObjectMetadata, ObjectStore};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub metadata: ObjectMetadata,
    pub acl: Acl,
}

#[derive(Clone)]
pub struct MockObjectStore {
    objects: Arc<Mutex<HashMap<(String, String), StoredObject>>>,
    buckets: Arc<Mutex<HashSet<String>>>,
    host: String,
    upload_count: Arc<Mutex<usize>>,
    acl_count: Arc<Mutex<usize>>,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self {
            objects: Arc::new(Mutex::new(HashMap::new())),
            buckets: Arc::new(Mutex::new(HashSet::new())),
            host: "mock-s3.example.com".to_string(),
            upload_count: Arc::new(Mutex::new(0)),
            acl_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_host(mut self, host: String) -> Self {
        self.host = host;
        self
    }

    /// Once any bucket is registered, only registered buckets are accepted.
    pub fn with_bucket(self, bucket: String) -> Self {
        self.buckets.lock().unwrap().insert(bucket);
        self
    }

    pub fn get_upload_count(&self) -> usize {
        *self.upload_count.lock().unwrap()
    }

    pub fn get_acl_count(&self) -> usize {
        *self.acl_count.lock().unwrap()
    }

    pub fn get_object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }
}

impl Default for MockObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn check_bucket(&self, bucket: &str) -> Result<()> {
        let buckets = self.buckets.lock().unwrap();
        if buckets.is_empty() || buckets.contains(bucket) {
            Ok(())
        } else {
            Err(Error::Storage(format!("Bucket not found: {}", bucket)))
        }
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        metadata: &ObjectMetadata,
    ) -> Result<()> {
        let mut count = self.upload_count.lock().unwrap();
        *count += 1;

        self.objects.lock().unwrap().insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                data,
                metadata: metadata.clone(),
                acl: Acl::Private,
            },
        );
        Ok(())
    }

    async fn set_acl(&self, bucket: &str, key: &str, acl: Acl) -> Result<()> {
        let mut count = self.acl_count.lock().unwrap();
        *count += 1;

        let mut objects = self.objects.lock().unwrap();
        match objects.get_mut(&(bucket.to_string(), key.to_string())) {
            Some(object) => {
                object.acl = acl;
                Ok(())
            }
            None => Err(Error::Storage(format!(
                "Object not found: {}/{}",
                bucket, key
            ))),
        }
    }

    fn object_url(&self, bucket: &str, key: &str) -> Result<String> {
        path_style_url(&self.host, bucket, key)
    }
}
