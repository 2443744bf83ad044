use axum::{routing::get, Router};

use crate::state::AppState;

pub mod dto;
pub mod filter;
pub mod handlers;
pub mod repo;
pub mod services;

pub fn router() -> Router<AppState> {
    let collection = get(handlers::list_users).post(handlers::create_user);
    let item = get(handlers::get_user)
        .put(handlers::update_user)
        .patch(handlers::update_user)
        .delete(handlers::delete_user);
    Router::new()
        .route("/users", collection.clone())
        .route("/users/", collection)
        .route("/users/:id", item.clone())
        .route("/users/:id/", item)
}

pub use repo::User;
