use axum::extract::State;
use tracing::{info, instrument, warn};

use super::dto::{LoginRequest, LogoutResponse, TokenResponse};
use super::password::verify_password;
use super::session::{BearerToken, SessionStore};
use crate::error::ApiError;
use crate::extract::Json;
use crate::state::AppState;
use crate::users::repo::User;

/// One generic failure for both unknown username and wrong password, so
/// the response never reveals which one it was.
fn invalid_credentials() -> ApiError {
    ApiError::BadRequest("invalid credentials".into())
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = match User::find_by_username(&state.db, &payload.username).await? {
        Some(u) => u,
        None => {
            warn!("login with unknown username");
            return Err(invalid_credentials());
        }
    };

    if !verify_password(&payload.password, &user.password_hash) {
        warn!(user_id = user.id, "login with invalid password");
        return Err(invalid_credentials());
    }

    let token = SessionStore::new(state.db.clone()).create(user.id).await?;
    info!(user_id = user.id, "user logged in");
    Ok(Json(TokenResponse { token }))
}

#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<Json<LogoutResponse>, ApiError> {
    let revoked = SessionStore::new(state.db.clone()).revoke(&token).await?;
    if !revoked {
        return Err(ApiError::Unauthorized("invalid token".into()));
    }
    info!("user logged out");
    Ok(Json(LogoutResponse {
        message: "Logged out successfully".into(),
    }))
}
