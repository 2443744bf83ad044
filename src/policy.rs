//! Per-action access rules. Reads are open and writes fail closed. The
//! extractors already turn a missing or invalid token into a 401 before
//! these checks run.

use crate::error::ApiError;
use crate::recipes::repo::Recipe;
use crate::users::repo::User;

/// Admin-or-read-only: writes to the users collection require the staff flag.
pub fn require_admin(user: &User) -> Result<(), ApiError> {
    if user.is_staff {
        Ok(())
    } else {
        Err(ApiError::Forbidden("staff privileges required".into()))
    }
}

/// Owner-or-read-only: recipe writes are restricted to the owning chef.
pub fn require_owner(user: &User, recipe: &Recipe) -> Result<(), ApiError> {
    if recipe.chef_id == user.id {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "only the chef may modify this recipe".into(),
        ))
    }
}
