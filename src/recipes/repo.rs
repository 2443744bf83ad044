use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::filter::{build_recipe_query, recipe_limit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum MealType {
    #[serde(rename = "B")]
    #[sqlx(rename = "B")]
    Breakfast,
    #[serde(rename = "L")]
    #[sqlx(rename = "L")]
    Lunch,
    #[serde(rename = "D")]
    #[sqlx(rename = "D")]
    Dinner,
}

impl MealType {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "B" => Some(Self::Breakfast),
            "L" => Some(Self::Lunch),
            "D" => Some(Self::Dinner),
            _ => None,
        }
    }
}

/// Recipe row joined with the chef's username; every select goes through
/// the join so the `chef` filter and responses have the name available.
#[derive(Debug, Clone, FromRow)]
pub struct Recipe {
    pub id: i64,
    pub chef_id: i64,
    pub chef_username: String,
    pub title: String,
    pub description: String,
    pub meal_type: MealType,
    pub ingredients: String,
    pub image: Option<Vec<u8>>,
    pub created_at: DateTime<Utc>,
}

/// Normalized record ready for insertion; output of the write pipeline.
#[derive(Debug)]
pub struct NewRecipe {
    pub chef_id: i64,
    pub title: String,
    pub description: String,
    pub meal_type: MealType,
    pub ingredients: String,
    pub image: Option<Vec<u8>>,
}

const RECIPE_COLUMNS: &str =
    "r.id, r.chef_id, u.username AS chef_username, r.title, r.description, \
     r.meal_type, r.ingredients, r.image, r.created_at";

impl Recipe {
    pub async fn find_by_id(db: &SqlitePool, id: i64) -> Result<Option<Recipe>, sqlx::Error> {
        sqlx::query_as::<_, Recipe>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes r JOIN users u ON u.id = r.chef_id \
             WHERE r.id = ?"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn insert(db: &SqlitePool, new: &NewRecipe) -> Result<Recipe, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO recipes (chef_id, title, description, meal_type, ingredients, image, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(new.chef_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.meal_type)
        .bind(&new.ingredients)
        .bind(&new.image)
        .bind(Utc::now())
        .execute(db)
        .await?;

        let id = result.last_insert_rowid();
        // the insert just succeeded, so the joined row exists
        Self::find_by_id(db, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Writes the mutable columns back; `created_at` stays immutable.
    pub async fn save(&self, db: &SqlitePool) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE recipes SET title = ?, description = ?, meal_type = ?, ingredients = ?, \
             image = ? WHERE id = ?",
        )
        .bind(&self.title)
        .bind(&self.description)
        .bind(self.meal_type)
        .bind(&self.ingredients)
        .bind(&self.image)
        .bind(self.id)
        .execute(db)
        .await?;
        Ok(())
    }

    pub async fn delete(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// `limit` is a post-filter: it truncates the result sequence after
    /// every other predicate has been applied.
    pub async fn list(
        db: &SqlitePool,
        params: &HashMap<String, String>,
    ) -> Result<Vec<Recipe>, sqlx::Error> {
        let mut query = build_recipe_query(params);
        let mut recipes = query.build_query_as::<Recipe>().fetch_all(db).await?;
        if let Some(limit) = recipe_limit(params) {
            recipes.truncate(limit);
        }
        Ok(recipes)
    }
}
