use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::filter::build_user_query;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum Sex {
    #[serde(rename = "M")]
    #[sqlx(rename = "M")]
    Male,
    #[serde(rename = "F")]
    #[sqlx(rename = "F")]
    Female,
    #[serde(rename = "O")]
    #[sqlx(rename = "O")]
    Other,
}

impl Sex {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "M" => Some(Self::Male),
            "F" => Some(Self::Female),
            "O" => Some(Self::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub sex: Option<Sex>,
    pub birthdate: Option<NaiveDate>,
    pub bio: Option<String>,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}

/// Normalized record ready for insertion; output of the write pipeline.
#[derive(Debug)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub sex: Option<Sex>,
    pub birthdate: Option<NaiveDate>,
    pub bio: Option<String>,
}

const USER_COLUMNS: &str = "id, username, password_hash, first_name, last_name, email, \
                            sex, birthdate, bio, is_staff, created_at";

impl User {
    pub async fn find_by_id(db: &SqlitePool, id: i64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_username(
        db: &SqlitePool,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(db)
        .await
    }

    pub async fn insert(db: &SqlitePool, new: &NewUser) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users \
             (username, password_hash, first_name, last_name, email, sex, birthdate, bio, is_staff, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, ?) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&new.username)
        .bind(&new.password_hash)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.email)
        .bind(new.sex)
        .bind(new.birthdate)
        .bind(&new.bio)
        .bind(Utc::now())
        .fetch_one(db)
        .await
    }

    /// Writes every mutable column of an already-merged row back.
    pub async fn save(&self, db: &SqlitePool) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET username = ?, password_hash = ?, first_name = ?, last_name = ?, \
             email = ?, sex = ?, birthdate = ?, bio = ? WHERE id = ?",
        )
        .bind(&self.username)
        .bind(&self.password_hash)
        .bind(&self.first_name)
        .bind(&self.last_name)
        .bind(&self.email)
        .bind(self.sex)
        .bind(self.birthdate)
        .bind(&self.bio)
        .bind(self.id)
        .execute(db)
        .await?;
        Ok(())
    }

    pub async fn delete(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list(
        db: &SqlitePool,
        params: &HashMap<String, String>,
    ) -> Result<Vec<User>, sqlx::Error> {
        let mut query = build_user_query(params);
        query.build_query_as::<User>().fetch_all(db).await
    }
}
