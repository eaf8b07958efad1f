use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use pantry_core::models::recipe::field;
use pantry_core::models::response::{CountResponse, MessageResponse, RecipeEnvelope, RecipeList};
use pantry_core::schema::Document;
use pantry_repository::CrudRepository;

use crate::config::DeleteErrors;
use crate::error::ApiError;
use crate::extract::{FilterExcludingWhereQuery, FilterQuery, JsonObject, RecipeIdPath, WhereQuery};
use crate::state::AppState;

pub const CREATED: &str = "Recipe successfully created!";
pub const DETAILS: &str = "Recipe details by id";
pub const UPDATED: &str = "Recipe successfully updated!";
pub const REMOVED: &str = "Recipe successfully removed!";
pub const NOT_FOUND: &str = "No Recipe found";

const TIMESTAMPS: [&str; 2] = [field::CREATED_AT, field::UPDATED_AT];

fn without(mut doc: Document, fields: &[&str]) -> Document {
    for name in fields {
        doc.remove(*name);
    }
    doc
}

pub async fn create_recipe(
    State(state): State<AppState>,
    JsonObject(data): JsonObject,
) -> Result<Json<RecipeEnvelope>, ApiError> {
    let created = state.recipes.create(data).await?;
    Ok(Json(RecipeEnvelope {
        message: CREATED.to_string(),
        recipe: vec![created],
    }))
}

pub async fn count_recipes(
    State(state): State<AppState>,
    WhereQuery(where_clause): WhereQuery,
) -> Result<Json<CountResponse>, ApiError> {
    let count = state.recipes.count(where_clause.as_ref()).await?;
    Ok(Json(CountResponse { count }))
}

pub async fn list_recipes(
    State(state): State<AppState>,
    FilterQuery(filter): FilterQuery,
) -> Result<Json<RecipeList>, ApiError> {
    let recipes = state
        .recipes
        .find(&filter)
        .await?
        .into_iter()
        .map(|doc| without(doc, &TIMESTAMPS))
        .collect();
    Ok(Json(RecipeList { recipes }))
}

pub async fn update_recipes(
    State(state): State<AppState>,
    WhereQuery(where_clause): WhereQuery,
    JsonObject(patch): JsonObject,
) -> Result<Json<CountResponse>, ApiError> {
    let count = state.recipes.update_all(patch, where_clause.as_ref()).await?;
    Ok(Json(CountResponse { count }))
}

pub async fn get_recipe(
    State(state): State<AppState>,
    path: RecipeIdPath,
    FilterExcludingWhereQuery(filter): FilterExcludingWhereQuery,
) -> Result<Json<RecipeEnvelope>, ApiError> {
    let id = path.id()?;
    let recipe = state.recipes.find_by_id(id, filter.as_ref()).await?;
    Ok(Json(RecipeEnvelope {
        message: DETAILS.to_string(),
        recipe: vec![without(recipe, &TIMESTAMPS)],
    }))
}

pub async fn update_recipe(
    State(state): State<AppState>,
    path: RecipeIdPath,
    JsonObject(patch): JsonObject,
) -> Result<Json<RecipeEnvelope>, ApiError> {
    let id = path.id()?;
    state.recipes.update_by_id(id, patch).await?;
    let updated = state.recipes.find_by_id(id, None).await?;
    Ok(Json(RecipeEnvelope {
        message: UPDATED.to_string(),
        recipe: vec![without(updated, &[field::ID, field::CREATED_AT, field::UPDATED_AT])],
    }))
}

pub async fn replace_recipe(
    State(state): State<AppState>,
    path: RecipeIdPath,
    JsonObject(data): JsonObject,
) -> Result<StatusCode, ApiError> {
    let id = path.id()?;
    state.recipes.replace_by_id(id, data).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_recipe(
    State(state): State<AppState>,
    path: RecipeIdPath,
) -> Result<Json<MessageResponse>, ApiError> {
    let deleted = match path.id() {
        Ok(id) => state.recipes.delete_by_id(id).await,
        Err(e) => Err(e),
    };
    match deleted {
        Ok(()) => Ok(Json(MessageResponse::new(REMOVED))),
        Err(e) if state.delete_errors == DeleteErrors::Surface => Err(e.into()),
        Err(e) => {
            if e.is_not_found() {
                tracing::info!(error = %e, "delete of missing recipe");
            } else {
                tracing::error!(error = %e, "recipe delete failed");
            }
            Ok(Json(MessageResponse::new(NOT_FOUND)))
        }
    }
}
