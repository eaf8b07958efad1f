use thiserror::Error;

use pantry_core::error::CoreError;
use pantry_core::filter::FilterError;
use pantry_core::schema::ValidationError;
use pantry_storage::error::StorageError;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Entity not found: {model} with id {id}")]
    EntityNotFound { model: String, id: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    InvalidFilter(#[from] FilterError),

    #[error("could not allocate an id for `{collection}` after {attempts} attempts")]
    SequenceContention { collection: String, attempts: usize },

    #[error("{key} kept changing; gave up after {attempts} attempts")]
    WriteContention { key: String, attempts: usize },

    #[error(transparent)]
    Entity(#[from] CoreError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("stored record {key} is not a JSON object")]
    CorruptRecord { key: String },
}

impl RepositoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::EntityNotFound { .. })
    }
}
