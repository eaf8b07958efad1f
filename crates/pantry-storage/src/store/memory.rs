use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::ObjectStore;
use crate::error::StorageError;
use crate::objects::{PutCondition, StoredObject};

struct Entry {
    body: Vec<u8>,
    etag: String,
}

#[derive(Default)]
struct Inner {
    objects: BTreeMap<String, Entry>,
    version: u64,
}

/// Process-local object store. Contents are lost when the process exits.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<StoredObject, StorageError> {
        let inner = self.inner.lock().await;
        let entry = inner
            .objects
            .get(key)
            .ok_or_else(|| StorageError::NotFound {
                key: key.to_string(),
            })?;
        Ok(StoredObject {
            body: entry.body.clone(),
            etag: Some(entry.etag.clone()),
            content_type: Some("application/json".to_string()),
        })
    }

    async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        condition: PutCondition,
    ) -> Result<String, StorageError> {
        let mut inner = self.inner.lock().await;

        let current = inner.objects.get(key).map(|e| e.etag.as_str());
        let allowed = match &condition {
            PutCondition::None => true,
            PutCondition::IfMatch(expected) => current == Some(expected.as_str()),
            PutCondition::IfNoneMatch => current.is_none(),
        };
        if !allowed {
            return Err(StorageError::PreconditionFailed {
                key: key.to_string(),
            });
        }

        inner.version += 1;
        let etag = format!("\"{}\"", inner.version);
        inner.objects.insert(
            key.to_string(),
            Entry {
                body,
                etag: etag.clone(),
            },
        );
        Ok(etag)
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.inner.lock().await.objects.remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .objects
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }
}
