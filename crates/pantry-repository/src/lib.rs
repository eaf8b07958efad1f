//! pantry-repository
//!
//! Generic CRUD over any [`pantry_core::models::Entity`], backed by any
//! [`pantry_storage::store::ObjectStore`]. Records are JSON documents at
//! `{collection}/{id}.json`; ids come from a per-collection sequence.

pub mod crud;
pub mod document;
pub mod error;
pub mod sequence;

use pantry_core::models::recipe::Recipe;

pub use crud::CrudRepository;
pub use document::DocumentRepository;
pub use error::RepositoryError;

pub type RecipeRepository = DocumentRepository<Recipe>;
