//! Response envelopes of the HTTP API.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::Document;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CountResponse {
    #[ts(type = "number")]
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A message plus the affected record, wrapped in a one-element array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RecipeEnvelope {
    pub message: String,
    #[ts(type = "Array<Record<string, unknown>>")]
    pub recipe: Vec<Document>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RecipeList {
    #[ts(type = "Array<Record<string, unknown>>")]
    pub recipes: Vec<Document>,
}
