use pantry_repository::RecipeRepository;

use crate::config::DeleteErrors;

/// Shared application state, injected into all route handlers via Axum state.
#[derive(Clone)]
pub struct AppState {
    pub recipes: RecipeRepository,
    pub delete_errors: DeleteErrors,
}

impl AppState {
    pub fn new(recipes: RecipeRepository, delete_errors: DeleteErrors) -> Self {
        Self {
            recipes,
            delete_errors,
        }
    }
}
