//! Validating extractors. Each one rejects a bad request with an
//! [`ApiError`] before the handler body runs.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use serde_json::Value;

use pantry_core::filter::{Filter, Where, query_string};
use pantry_core::models::recipe;
use pantry_core::schema::Document;
use pantry_repository::RepositoryError;

use crate::error::ApiError;

/// Record id from the path. Any well-formed number is accepted; one that
/// no record can have (negative, fractional) resolves to NotFound.
#[derive(Debug, Clone)]
pub struct RecipeIdPath {
    raw: String,
    id: Option<u64>,
}

impl RecipeIdPath {
    pub fn parse(raw: &str) -> Result<Self, ApiError> {
        let id = match raw.parse::<u64>() {
            Ok(id) => Some(id),
            Err(_) => {
                let number = raw
                    .parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .ok_or_else(|| {
                        ApiError::invalid_parameter(format!("invalid id `{raw}`: expected a number"))
                    })?;
                (number >= 0.0 && number.fract() == 0.0 && number <= u64::MAX as f64)
                    .then_some(number as u64)
            }
        };
        Ok(Self {
            raw: raw.to_string(),
            id,
        })
    }

    /// The record id, or `EntityNotFound` for a number no record can have.
    pub fn id(&self) -> Result<u64, RepositoryError> {
        self.id.ok_or_else(|| RepositoryError::EntityNotFound {
            model: recipe::MODEL_NAME.to_string(),
            id: self.raw.clone(),
        })
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RecipeIdPath {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::invalid_parameter(e.body_text()))?;
        Self::parse(&raw)
    }
}

/// Request body that must be a JSON object.
#[derive(Debug, Clone)]
pub struct JsonObject(pub Document);

impl<S: Send + Sync> FromRequest<S> for JsonObject {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| match rejection {
                JsonRejection::MissingJsonContentType(e) => {
                    ApiError::UnsupportedMediaType(e.body_text())
                }
                other => ApiError::invalid_body(other.body_text()),
            })?;

        match value {
            Value::Object(doc) => Ok(JsonObject(doc)),
            _ => Err(ApiError::invalid_body("request body must be a JSON object")),
        }
    }
}

async fn query_value<S: Send + Sync>(
    parts: &mut Parts,
    state: &S,
    root: &str,
) -> Result<Option<Value>, ApiError> {
    let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state)
        .await
        .map_err(|e| ApiError::invalid_parameter(e.body_text()))?;
    Ok(query_string::extract(&pairs, root)?)
}

/// Optional `where` query parameter.
#[derive(Debug, Clone)]
pub struct WhereQuery(pub Option<Where>);

impl<S: Send + Sync> FromRequestParts<S> for WhereQuery {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let where_clause = match query_value(parts, state, "where").await? {
            Some(value) => Some(Where::from_value(&value)?),
            None => None,
        };
        Ok(WhereQuery(where_clause))
    }
}

/// Optional `filter` query parameter; absent means "everything".
#[derive(Debug, Clone)]
pub struct FilterQuery(pub Filter);

impl<S: Send + Sync> FromRequestParts<S> for FilterQuery {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let filter = match query_value(parts, state, "filter").await? {
            Some(value) => Filter::from_value(&value)?,
            None => Filter::default(),
        };
        Ok(FilterQuery(filter))
    }
}

/// Optional `filter` query parameter that may not carry a `where` clause.
#[derive(Debug, Clone)]
pub struct FilterExcludingWhereQuery(pub Option<Filter>);

impl<S: Send + Sync> FromRequestParts<S> for FilterExcludingWhereQuery {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let filter = match query_value(parts, state, "filter").await? {
            Some(value) => Some(Filter::excluding_where(&value)?),
            None => None,
        };
        Ok(FilterExcludingWhereQuery(filter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_ids_resolve() {
        assert_eq!(RecipeIdPath::parse("42").unwrap().id().unwrap(), 42);
        assert_eq!(RecipeIdPath::parse("0").unwrap().id().unwrap(), 0);
        assert_eq!(RecipeIdPath::parse("7.0").unwrap().id().unwrap(), 7);
    }

    #[test]
    fn numbers_no_record_can_have_are_not_found() {
        for raw in ["-1", "1.5", "-0.5"] {
            let err = RecipeIdPath::parse(raw).unwrap().id().unwrap_err();
            assert!(err.is_not_found(), "{raw}");
            assert_eq!(err.to_string(), format!("Entity not found: Recipe with id {raw}"));
        }
    }

    #[test]
    fn non_numbers_are_rejected() {
        for raw in ["abc", "1x", "NaN", "inf", ""] {
            assert!(RecipeIdPath::parse(raw).is_err(), "{raw}");
        }
    }
}
