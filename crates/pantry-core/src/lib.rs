//! pantry-core
//!
//! Pure domain types: the Recipe model, its schema, the filter language
//! used by read and bulk-update operations, and storage key conventions.
//! No I/O. This is the shared vocabulary of the Pantry service.

pub mod error;
pub mod filter;
pub mod keys;
pub mod models;
pub mod schema;
