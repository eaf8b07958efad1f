//! The datastore seam: every backend stores opaque bytes under string
//! keys, hands out ETags, and honors [`PutCondition`]s.

mod memory;
mod s3;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::objects::{PutCondition, StoredObject};

pub use memory::MemoryStore;
pub use s3::S3Store;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch an object; `StorageError::NotFound` if the key is absent.
    async fn get(&self, key: &str) -> Result<StoredObject, StorageError>;

    /// Write an object and return its new ETag.
    async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        condition: PutCondition,
    ) -> Result<String, StorageError>;

    /// Remove an object. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Keys under `prefix`, in lexicographic order.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
}
