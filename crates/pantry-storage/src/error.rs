use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {key}")]
    NotFound { key: String },

    /// An `If-Match` / `If-None-Match` condition did not hold.
    #[error("precondition failed for key: {key}")]
    PreconditionFailed { key: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("object get failed: {0}")]
    Get(String),

    #[error("object put failed: {0}")]
    Put(String),

    #[error("object delete failed: {0}")]
    Delete(String),

    #[error("object listing failed: {0}")]
    List(String),
}
