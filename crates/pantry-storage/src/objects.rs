use aws_sdk_s3::Client;
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_smithy_types::byte_stream::ByteStream;

use crate::error::StorageError;

/// An object as read back from a store: body, ETag and content type.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub etag: Option<String>,
    pub content_type: Option<String>,
}

/// Precondition attached to a PUT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutCondition {
    None,
    /// Only overwrite if the current ETag matches (optimistic locking).
    IfMatch(String),
    /// Only write if no object exists at the key.
    IfNoneMatch,
}

/// Get an object from S3.
pub async fn get_object(
    client: &Client,
    bucket: &str,
    key: &str,
) -> Result<StoredObject, StorageError> {
    let resp = client
        .get_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| {
            let err = e.into_service_error();
            if err.is_no_such_key() {
                StorageError::NotFound {
                    key: key.to_string(),
                }
            } else {
                StorageError::Get(err.to_string())
            }
        })?;

    let etag = resp.e_tag().map(|s| s.to_string());
    let content_type = resp.content_type().map(|s| s.to_string());
    let body = resp
        .body
        .collect()
        .await
        .map_err(|e| StorageError::Get(e.to_string()))?
        .into_bytes()
        .to_vec();

    Ok(StoredObject {
        body,
        etag,
        content_type,
    })
}

/// Put an object to S3. Returns the new ETag, or
/// `StorageError::PreconditionFailed` if `condition` does not hold.
pub async fn put_object(
    client: &Client,
    bucket: &str,
    key: &str,
    body: Vec<u8>,
    content_type: Option<&str>,
    condition: &PutCondition,
) -> Result<String, StorageError> {
    let mut req = client
        .put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from(body));

    if let Some(ct) = content_type {
        req = req.content_type(ct);
    }

    req = match condition {
        PutCondition::None => req,
        PutCondition::IfMatch(etag) => req.if_match(etag),
        PutCondition::IfNoneMatch => req.if_none_match("*"),
    };

    let resp = req.send().await.map_err(|e| {
        let err = e.into_service_error();
        // 412 when the precondition fails, 409 when a concurrent
        // conditional write to the same key won
        match err.code() {
            Some("PreconditionFailed" | "ConditionalRequestConflict") => {
                tracing::debug!(key, code = err.code(), "conditional put rejected");
                StorageError::PreconditionFailed {
                    key: key.to_string(),
                }
            }
            _ => StorageError::Put(err.to_string()),
        }
    })?;

    Ok(resp.e_tag().unwrap_or_default().to_string())
}

/// Delete an object from S3. Deleting a missing key succeeds.
pub async fn delete_object(client: &Client, bucket: &str, key: &str) -> Result<(), StorageError> {
    client
        .delete_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| StorageError::Delete(e.into_service_error().to_string()))?;

    Ok(())
}

/// List objects under a prefix. Returns keys.
pub async fn list_objects(
    client: &Client,
    bucket: &str,
    prefix: &str,
) -> Result<Vec<String>, StorageError> {
    let mut keys = Vec::new();
    let mut continuation_token: Option<String> = None;

    loop {
        let mut req = client.list_objects_v2().bucket(bucket).prefix(prefix);

        if let Some(token) = &continuation_token {
            req = req.continuation_token(token);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| StorageError::List(e.into_service_error().to_string()))?;

        for obj in resp.contents() {
            if let Some(key) = obj.key() {
                keys.push(key.to_string());
            }
        }

        if resp.is_truncated() == Some(true) {
            continuation_token = resp.next_continuation_token().map(|s| s.to_string());
        } else {
            break;
        }
    }

    Ok(keys)
}
