use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::{info, instrument};

use super::dto::{CreateRecipeRequest, RecipeResponse, UpdateRecipeRequest};
use super::repo::Recipe;
use super::services;
use crate::auth::session::AuthUser;
use crate::error::ApiError;
use crate::extract::Json;
use crate::policy::require_owner;
use crate::state::AppState;
use crate::users::dto::MessageResponse;

#[instrument(skip_all)]
pub async fn list_recipes(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<RecipeResponse>>, ApiError> {
    let recipes = Recipe::list(&state.db, &params).await?;
    Ok(Json(recipes.into_iter().map(RecipeResponse::from).collect()))
}

#[instrument(skip_all)]
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<RecipeResponse>, ApiError> {
    let recipe = Recipe::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("recipe"))?;
    Ok(Json(recipe.into()))
}

/// The authenticated requester becomes the chef.
#[instrument(skip_all)]
pub async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(chef): AuthUser,
    Json(req): Json<CreateRecipeRequest>,
) -> Result<(StatusCode, Json<RecipeResponse>), ApiError> {
    let new = services::prepare_new_recipe(req, chef.id)?;
    let recipe = Recipe::insert(&state.db, &new).await?;
    info!(recipe_id = recipe.id, chef_id = chef.id, "recipe created");
    Ok((StatusCode::CREATED, Json(recipe.into())))
}

#[instrument(skip_all)]
pub async fn update_recipe(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateRecipeRequest>,
) -> Result<Json<RecipeResponse>, ApiError> {
    let mut recipe = Recipe::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("recipe"))?;
    require_owner(&actor, &recipe)?;

    services::validate_recipe_update(&req)?;
    services::merge_recipe_update(&mut recipe, req)?;
    recipe.save(&state.db).await?;

    info!(recipe_id = recipe.id, chef_id = actor.id, "recipe updated");
    Ok(Json(recipe.into()))
}

#[instrument(skip_all)]
pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let recipe = Recipe::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("recipe"))?;
    require_owner(&actor, &recipe)?;

    Recipe::delete(&state.db, id).await?;
    info!(recipe_id = id, chef_id = actor.id, "recipe deleted");
    Ok(Json(MessageResponse {
        message: "deleted".into(),
    }))
}
