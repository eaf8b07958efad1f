pub mod recipe;
pub mod response;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::CoreError;
use crate::schema::{Document, ModelSchema};

/// A persisted model. Repositories are generic over this trait; the
/// schema tells them how to validate, default and key the records.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn schema() -> &'static ModelSchema;

    /// Decode a stored document into the typed model.
    fn from_document(doc: Document) -> Result<Self, CoreError> {
        Ok(serde_json::from_value(Value::Object(doc))?)
    }
}
