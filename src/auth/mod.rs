use axum::{routing::post, Router};

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod password;
pub mod session;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(handlers::login))
        .route("/login/", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/logout/", post(handlers::logout))
}
