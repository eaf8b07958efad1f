//! pantry-storage
//!
//! Object storage for Pantry records. One [`store::ObjectStore`] trait with
//! an S3 backend (thin wrapper around the AWS S3 SDK) and an in-memory
//! backend for tests and local runs.

pub mod client;
pub mod error;
pub mod objects;
pub mod state;
pub mod store;
