use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use tracing::{info, instrument, warn};

use super::dto::{CreateUserRequest, MessageResponse, UpdateUserRequest, UserResponse};
use super::repo::User;
use super::services;
use crate::auth::password::hash_password;
use crate::auth::session::AuthUser;
use crate::error::ApiError;
use crate::extract::Json;
use crate::policy::require_admin;
use crate::state::AppState;

#[instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = User::list(&state.db, &params).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[instrument(skip_all)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let today = Utc::now().date_naive();
    services::validate_new_user(&req, today)?;

    let hash = hash_password(&req.password).map_err(ApiError::Internal)?;
    let new = services::prepare_new_user(req, hash);

    let user = match User::insert(&state.db, &new).await {
        Ok(u) => u,
        Err(e) if is_unique_violation(&e) => {
            warn!(username = %new.username, "duplicate username");
            return Err(ApiError::field(
                "username",
                "a user with that username already exists",
            ));
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = user.id, username = %user.username, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip_all)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    Ok(Json(user.into()))
}

#[instrument(skip_all)]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    require_admin(&actor)?;

    let mut user = User::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    let today = Utc::now().date_naive();
    services::validate_user_update(&req, today)?;

    let password = req.password.clone();
    services::merge_user_update(&mut user, req);
    if let Some(password) = password {
        user.password_hash = hash_password(&password).map_err(ApiError::Internal)?;
    }
    if let Err(e) = user.save(&state.db).await {
        if is_unique_violation(&e) {
            warn!(username = %user.username, "duplicate username");
            return Err(ApiError::field(
                "username",
                "a user with that username already exists",
            ));
        }
        return Err(e.into());
    }

    info!(user_id = user.id, actor_id = actor.id, "user updated");
    Ok(Json(user.into()))
}

#[instrument(skip_all)]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    require_admin(&actor)?;

    if !User::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("user"));
    }

    info!(user_id = id, actor_id = actor.id, "user deleted");
    Ok(Json(MessageResponse {
        message: "deleted".into(),
    }))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}
