//! Token-backed sessions. The store is an explicit mapping from an opaque
//! bearer secret to a user, persisted in `auth_tokens`; minting and
//! revoking are each a single row write. Tokens carry no expiry.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use sqlx::SqlitePool;

use crate::error::ApiError;
use crate::state::AppState;
use crate::users::repo::User;

const TOKEN_LEN: usize = 40;

#[derive(Clone)]
pub struct SessionStore {
    db: SqlitePool,
}

impl SessionStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Mints a fresh token bound to `user_id`. Existing tokens for the
    /// same user stay valid; re-login adds a session rather than
    /// replacing one.
    pub async fn create(&self, user_id: i64) -> Result<String, sqlx::Error> {
        let token = mint_token();
        sqlx::query("INSERT INTO auth_tokens (token, user_id, created_at) VALUES (?, ?, ?)")
            .bind(&token)
            .bind(user_id)
            .bind(Utc::now())
            .execute(&self.db)
            .await?;
        Ok(token)
    }

    /// Deletes the token row; returns whether it existed.
    pub async fn revoke(&self, token: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE token = ?")
            .bind(token)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Resolves a presented token to its owner, if any.
    pub async fn resolve(&self, token: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT u.id, u.username, u.password_hash, u.first_name, u.last_name, u.email, \
             u.sex, u.birthdate, u.bio, u.is_staff, u.created_at \
             FROM users u JOIN auth_tokens t ON t.user_id = u.id WHERE t.token = ?",
        )
        .bind(token)
        .fetch_optional(&self.db)
        .await
    }
}

fn mint_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Pulls the bearer secret out of the Authorization header. Both the
/// `Token` and `Bearer` schemes are accepted.
fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let auth = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("missing Authorization header".into()))?;

    auth.strip_prefix("Token ")
        .or_else(|| auth.strip_prefix("Bearer "))
        .or_else(|| auth.strip_prefix("bearer "))
        .ok_or_else(|| ApiError::Unauthorized("invalid auth scheme".into()))
}

/// Extracts a valid token's owner; rejects with 401 otherwise.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let user = SessionStore::new(state.db.clone())
            .resolve(token)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("invalid token".into()))?;
        Ok(AuthUser(user))
    }
}

/// Extracts the raw presented token without resolving it; logout needs
/// the secret itself to tear the session down.
pub struct BearerToken(pub String);

#[async_trait]
impl FromRequestParts<AppState> for BearerToken {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(BearerToken(bearer_token(parts)?.to_string()))
    }
}
