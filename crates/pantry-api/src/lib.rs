//! pantry-api
//!
//! HTTP surface of the Pantry service: the route table, request
//! extraction and validation, response shaping and error mapping.

use axum::Router;
use axum::middleware as axum_mw;
use axum::routing::{delete, get, patch, post, put};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod state;

use state::AppState;

/// Build the application router over `state`.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health (no datastore access)
        .route("/health", get(routes::health::health_check))
        // Recipes
        .route("/recipes", post(routes::recipes::create_recipe))
        .route("/recipes", get(routes::recipes::list_recipes))
        .route("/recipes", patch(routes::recipes::update_recipes))
        .route("/recipes/count", get(routes::recipes::count_recipes))
        .route("/recipes/{id}", get(routes::recipes::get_recipe))
        .route("/recipes/{id}", patch(routes::recipes::update_recipe))
        .route("/recipes/{id}", put(routes::recipes::replace_recipe))
        .route("/recipes/{id}", delete(routes::recipes::delete_recipe))
        .layer(
            ServiceBuilder::new()
                .layer(cors)
                .layer(axum_mw::from_fn(middleware::access_log::access_log)),
        )
        .with_state(state)
}
