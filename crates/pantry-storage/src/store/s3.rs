use async_trait::async_trait;
use aws_sdk_s3::Client;

use super::ObjectStore;
use crate::error::StorageError;
use crate::objects::{self, StoredObject, PutCondition};

const JSON: &str = "application/json";

/// Objects in a single S3 bucket.
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn get(&self, key: &str) -> Result<StoredObject, StorageError> {
        objects::get_object(&self.client, &self.bucket, key).await
    }

    async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        condition: PutCondition,
    ) -> Result<String, StorageError> {
        objects::put_object(&self.client, &self.bucket, key, body, Some(JSON), &condition).await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        objects::delete_object(&self.client, &self.bucket, key).await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        // ListObjectsV2 already returns keys in UTF-8 binary order
        objects::list_objects(&self.client, &self.bucket, prefix).await
    }
}
