use async_trait::async_trait;

use pantry_core::filter::{Filter, Where};
use pantry_core::models::Entity;
use pantry_core::schema::Document;

use crate::error::RepositoryError;

/// The CRUD capability set of a model repository.
///
/// Records travel as [`Document`]s so that projections and the open
/// (non-schema) properties of non-strict models survive every operation.
#[async_trait]
pub trait CrudRepository<E: Entity>: Send + Sync {
    /// Validate, default and persist a new record. Returns it with its id.
    async fn create(&self, data: Document) -> Result<Document, RepositoryError>;

    async fn find(&self, filter: &Filter) -> Result<Vec<Document>, RepositoryError>;

    async fn count(&self, where_clause: Option<&Where>) -> Result<u64, RepositoryError>;

    /// `EntityNotFound` if no record has this id.
    async fn find_by_id(
        &self,
        id: u64,
        filter: Option<&Filter>,
    ) -> Result<Document, RepositoryError>;

    /// Merge `patch` into every matching record. Returns how many changed.
    async fn update_all(
        &self,
        patch: Document,
        where_clause: Option<&Where>,
    ) -> Result<u64, RepositoryError>;

    async fn update_by_id(&self, id: u64, patch: Document) -> Result<(), RepositoryError>;

    /// Overwrite every property of an existing record with `data`.
    async fn replace_by_id(&self, id: u64, data: Document) -> Result<(), RepositoryError>;

    async fn delete_by_id(&self, id: u64) -> Result<(), RepositoryError>;

    async fn exists(&self, id: u64) -> Result<bool, RepositoryError>;
}
