use serde::{Serialize, de::DeserializeOwned};

use crate::error::StorageError;
use crate::objects::PutCondition;
use crate::store::ObjectStore;

/// Load a JSON state document. Returns the deserialized value and its ETag.
pub async fn load_state<T: DeserializeOwned>(
    store: &dyn ObjectStore,
    key: &str,
) -> Result<(T, String), StorageError> {
    let output = store.get(key).await?;
    let value: T = serde_json::from_slice(&output.body)?;
    let etag = output.etag.unwrap_or_default();
    Ok((value, etag))
}

/// Save a JSON state document with ETag optimistic locking.
/// Returns the new ETag, or `StorageError::PreconditionFailed` if another
/// writer got there first.
pub async fn save_state_if_match<T: Serialize>(
    store: &dyn ObjectStore,
    key: &str,
    value: &T,
    expected_etag: &str,
) -> Result<String, StorageError> {
    let body = serde_json::to_vec_pretty(value)?;
    store
        .put(key, body, PutCondition::IfMatch(expected_etag.to_string()))
        .await
}

/// Create a JSON state document, failing with
/// `StorageError::PreconditionFailed` if one already exists.
pub async fn create_state<T: Serialize>(
    store: &dyn ObjectStore,
    key: &str,
    value: &T,
) -> Result<String, StorageError> {
    let body = serde_json::to_vec_pretty(value)?;
    store.put(key, body, PutCondition::IfNoneMatch).await
}
