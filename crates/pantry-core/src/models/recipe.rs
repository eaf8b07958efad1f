use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use ts_rs::TS;

use super::Entity;
use crate::schema::{DefaultFn, ModelSchema, Property, PropertyKind};

/// Property names of the Recipe model.
pub mod field {
    pub const ID: &str = "id";
    pub const TITLE: &str = "title";
    pub const MAKING_TIME: &str = "making_time";
    pub const SERVES: &str = "serves";
    pub const INGREDIENTS: &str = "ingredients";
    pub const COST: &str = "cost";
    pub const CREATED_AT: &str = "created_at";
    pub const UPDATED_AT: &str = "updated_at";
}

pub const MODEL_NAME: &str = "Recipe";
pub const COLLECTION: &str = "recipes";

static SCHEMA: LazyLock<ModelSchema> = LazyLock::new(|| {
    ModelSchema::new(MODEL_NAME, COLLECTION)
        .strict(false)
        .property(Property::new(field::ID, PropertyKind::Integer).generated_id())
        .property(Property::new(field::TITLE, PropertyKind::String).required())
        .property(Property::new(field::MAKING_TIME, PropertyKind::String).required())
        .property(Property::new(field::SERVES, PropertyKind::String).required())
        .property(Property::new(field::INGREDIENTS, PropertyKind::String).required())
        .property(Property::new(field::COST, PropertyKind::Number).required())
        .property(Property::new(field::CREATED_AT, PropertyKind::Date).default_fn(DefaultFn::Now))
        .property(Property::new(field::UPDATED_AT, PropertyKind::Date).default_fn(DefaultFn::Now))
});

/// A recipe. `making_time`, `serves` and `ingredients` are free-form text.
///
/// The model is non-strict: properties it does not declare are kept in
/// `extra` and flattened back into the record when serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Recipe {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub title: String,
    pub making_time: String,
    pub serves: String,
    pub ingredients: String,
    /// Kept as the submitted JSON number so integers stay integers.
    #[ts(type = "number")]
    pub cost: Number,
    pub created_at: jiff::Timestamp,
    pub updated_at: jiff::Timestamp,
    #[serde(flatten)]
    #[ts(skip)]
    pub extra: Map<String, Value>,
}

impl Entity for Recipe {
    fn schema() -> &'static ModelSchema {
        &SCHEMA
    }
}
