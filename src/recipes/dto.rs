use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::repo::{MealType, Recipe};

/// Creation payload; `image` crosses the wire as base64.
#[derive(Debug, Deserialize)]
pub struct CreateRecipeRequest {
    pub title: String,
    pub description: String,
    pub meal_type: MealType,
    #[serde(default)]
    pub ingredients: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateRecipeRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub meal_type: Option<MealType>,
    pub ingredients: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecipeResponse {
    pub id: i64,
    pub chef: i64,
    pub chef_username: String,
    pub title: String,
    pub description: String,
    pub meal_type: MealType,
    pub ingredients: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Recipe> for RecipeResponse {
    fn from(r: Recipe) -> Self {
        Self {
            id: r.id,
            chef: r.chef_id,
            chef_username: r.chef_username,
            title: r.title,
            description: r.description,
            meal_type: r.meal_type,
            ingredients: r.ingredients,
            image: r.image.map(|bytes| BASE64.encode(bytes)),
            created_at: r.created_at,
        }
    }
}
