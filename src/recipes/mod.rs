use axum::{routing::get, Router};

use crate::state::AppState;

pub mod dto;
pub mod filter;
pub mod handlers;
pub mod repo;
pub mod services;

pub fn router() -> Router<AppState> {
    let collection = get(handlers::list_recipes).post(handlers::create_recipe);
    let item = get(handlers::get_recipe)
        .put(handlers::update_recipe)
        .patch(handlers::update_recipe)
        .delete(handlers::delete_recipe);
    Router::new()
        .route("/recipes", collection.clone())
        .route("/recipes/", collection)
        .route("/recipes/:id", item.clone())
        .route("/recipes/:id/", item)
}

pub use repo::Recipe;
