use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use pantry_core::filter::{Filter, Where};
use pantry_core::keys;
use pantry_core::models::Entity;
use pantry_core::schema::{Document, ModelSchema, ValidationError, ValidationMode, ViolationCode};
use pantry_storage::error::StorageError;
use pantry_storage::objects::PutCondition;
use pantry_storage::store::ObjectStore;

use crate::crud::CrudRepository;
use crate::error::RepositoryError;
use crate::sequence;

/// How many times a read-modify-write is retried after another writer
/// changed the record between the read and the write.
pub const MAX_WRITE_ATTEMPTS: usize = 8;

/// CRUD for entity `E`, one JSON document per record in an [`ObjectStore`].
pub struct DocumentRepository<E> {
    store: Arc<dyn ObjectStore>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for DocumentRepository<E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> DocumentRepository<E> {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    fn schema() -> &'static ModelSchema {
        E::schema()
    }

    fn id_field() -> &'static str {
        Self::schema().id_property().map_or("id", |p| p.name)
    }

    fn key(id: u64) -> String {
        keys::record(Self::schema().collection(), id)
    }

    fn not_found(id: u64) -> RepositoryError {
        RepositoryError::EntityNotFound {
            model: Self::schema().name().to_string(),
            id: id.to_string(),
        }
    }

    /// A record and the condition under which it may be written back.
    async fn load(&self, id: u64) -> Result<(Document, PutCondition), RepositoryError> {
        let key = Self::key(id);
        match self.store.get(&key).await {
            Ok(output) => Ok((parse_document(&key, &output.body)?, unchanged_since(output.etag))),
            Err(StorageError::NotFound { .. }) => Err(Self::not_found(id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Every stored record, in no particular order.
    async fn load_all(&self) -> Result<Vec<(u64, Document, PutCondition)>, RepositoryError> {
        let collection = Self::schema().collection();
        let keys = self.store.list(&keys::collection_prefix(collection)).await?;

        let mut docs = Vec::with_capacity(keys.len());
        for key in &keys {
            let Some(id) = keys::parse_record_id(collection, key) else {
                continue;
            };
            match self.store.get(key).await {
                Ok(output) => docs.push((
                    id,
                    parse_document(key, &output.body)?,
                    unchanged_since(output.etag),
                )),
                // Deleted between the listing and the read
                Err(StorageError::NotFound { .. }) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(docs)
    }

    /// Write a record that must still decode as `E`. Returns `false` when
    /// `condition` no longer holds.
    async fn write(
        &self,
        id: u64,
        doc: &Document,
        condition: PutCondition,
    ) -> Result<bool, RepositoryError> {
        E::from_document(doc.clone())?;
        let body = serde_json::to_vec(doc)?;
        match self.store.put(&Self::key(id), body, condition).await {
            Ok(_) => Ok(true),
            Err(StorageError::PreconditionFailed { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Merge `patch` into record `id` if it exists and matches
    /// `where_clause`. Returns whether the record was written.
    ///
    /// `current` is the record as already read by the caller, if any. A
    /// write that loses a race is re-read and retried, so a record deleted
    /// in the meantime stays deleted.
    async fn patch_one(
        &self,
        id: u64,
        mut current: Option<(Document, PutCondition)>,
        patch: &Document,
        where_clause: Option<&Where>,
    ) -> Result<bool, RepositoryError> {
        for _ in 0..MAX_WRITE_ATTEMPTS {
            let (mut doc, condition) = match current.take() {
                Some(loaded) => loaded,
                None => match self.load(id).await {
                    Ok(loaded) => loaded,
                    Err(e) if e.is_not_found() => return Ok(false),
                    Err(e) => return Err(e),
                },
            };
            if where_clause.is_some_and(|w| !w.matches(&doc)) {
                return Ok(false);
            }
            merge(&mut doc, patch);
            if self.write(id, &doc, condition).await? {
                return Ok(true);
            }
            tracing::debug!(
                model = Self::schema().name(),
                id,
                "record changed underneath a patch, retrying"
            );
        }
        Err(Self::contention(id))
    }

    fn contention(id: u64) -> RepositoryError {
        RepositoryError::WriteContention {
            key: Self::key(id),
            attempts: MAX_WRITE_ATTEMPTS,
        }
    }

    /// Reject a patch or replacement that would change the record's id.
    fn check_id(doc: &Document, id: Option<u64>) -> Result<(), ValidationError> {
        let field = Self::id_field();
        let Some(value) = doc.get(field).filter(|v| !v.is_null()) else {
            return Ok(());
        };
        if id.is_some() && value.as_u64() == id {
            return Ok(());
        }
        Err(ValidationError::single(
            Self::schema().name(),
            field,
            ViolationCode::Immutable,
            "cannot be changed",
        ))
    }
}

fn parse_document(key: &str, body: &[u8]) -> Result<Document, RepositoryError> {
    match serde_json::from_slice(body)? {
        Value::Object(doc) => Ok(doc),
        _ => Err(RepositoryError::CorruptRecord {
            key: key.to_string(),
        }),
    }
}

fn unchanged_since(etag: Option<String>) -> PutCondition {
    etag.map_or(PutCondition::None, PutCondition::IfMatch)
}

fn merge(target: &mut Document, patch: &Document) {
    for (k, v) in patch {
        target.insert(k.clone(), v.clone());
    }
}

#[async_trait]
impl<E: Entity> CrudRepository<E> for DocumentRepository<E> {
    async fn create(&self, mut data: Document) -> Result<Document, RepositoryError> {
        let schema = Self::schema();
        schema.validate(&data, ValidationMode::Create)?;
        schema.apply_defaults(&mut data, jiff::Timestamp::now());

        let id = sequence::next_id(self.store.as_ref(), schema.collection()).await?;
        data.insert(Self::id_field().to_string(), Value::from(id));

        if !self.write(id, &data, PutCondition::IfNoneMatch).await? {
            return Err(Self::contention(id));
        }
        tracing::info!(model = schema.name(), id, "record created");
        Ok(data)
    }

    async fn find(&self, filter: &Filter) -> Result<Vec<Document>, RepositoryError> {
        let docs = self.load_all().await?.into_iter().map(|(_, doc, _)| doc).collect();
        Ok(filter.apply(docs, Self::id_field()))
    }

    async fn count(&self, where_clause: Option<&Where>) -> Result<u64, RepositoryError> {
        let docs = self.load_all().await?;
        let count = docs
            .iter()
            .filter(|(_, doc, _)| where_clause.is_none_or(|w| w.matches(doc)))
            .count();
        Ok(count as u64)
    }

    async fn find_by_id(
        &self,
        id: u64,
        filter: Option<&Filter>,
    ) -> Result<Document, RepositoryError> {
        let (doc, _) = self.load(id).await?;
        let Some(filter) = filter else {
            return Ok(doc);
        };
        if !filter.matches(&doc) {
            return Err(Self::not_found(id));
        }
        Ok(match &filter.fields {
            Some(fields) => fields.project(doc),
            None => doc,
        })
    }

    async fn update_all(
        &self,
        patch: Document,
        where_clause: Option<&Where>,
    ) -> Result<u64, RepositoryError> {
        let schema = Self::schema();
        schema.validate(&patch, ValidationMode::Partial)?;
        Self::check_id(&patch, None)?;

        let mut updated = 0;
        for (id, doc, condition) in self.load_all().await? {
            if self.patch_one(id, Some((doc, condition)), &patch, where_clause).await? {
                updated += 1;
            }
        }

        tracing::info!(model = schema.name(), count = updated, "records updated");
        Ok(updated)
    }

    async fn update_by_id(&self, id: u64, patch: Document) -> Result<(), RepositoryError> {
        let schema = Self::schema();
        schema.validate(&patch, ValidationMode::Partial)?;
        Self::check_id(&patch, Some(id))?;

        if !self.patch_one(id, None, &patch, None).await? {
            return Err(Self::not_found(id));
        }

        tracing::info!(model = schema.name(), id, "record updated");
        Ok(())
    }

    async fn replace_by_id(&self, id: u64, mut data: Document) -> Result<(), RepositoryError> {
        let schema = Self::schema();
        schema.validate(&data, ValidationMode::Replace)?;
        Self::check_id(&data, Some(id))?;

        schema.apply_defaults(&mut data, jiff::Timestamp::now());
        data.insert(Self::id_field().to_string(), Value::from(id));

        let mut replaced = false;
        for _ in 0..MAX_WRITE_ATTEMPTS {
            // Only the version matters; a deleted record must not come back.
            let (_, condition) = self.load(id).await?;
            if self.write(id, &data, condition).await? {
                replaced = true;
                break;
            }
        }
        if !replaced {
            return Err(Self::contention(id));
        }

        tracing::info!(model = schema.name(), id, "record replaced");
        Ok(())
    }

    async fn delete_by_id(&self, id: u64) -> Result<(), RepositoryError> {
        if !self.exists(id).await? {
            return Err(Self::not_found(id));
        }
        self.store.delete(&Self::key(id)).await?;

        tracing::info!(model = Self::schema().name(), id, "record deleted");
        Ok(())
    }

    async fn exists(&self, id: u64) -> Result<bool, RepositoryError> {
        match self.store.get(&Self::key(id)).await {
            Ok(_) => Ok(true),
            Err(StorageError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
