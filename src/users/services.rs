//! Write pipeline for the users resource: per-field checks first (all
//! failures accumulated), then the fixed normalization order of
//! slugified username followed by sanitize -> `$` pass-through -> slugify
//! on the bio.

use chrono::NaiveDate;

use super::dto::{CreateUserRequest, UpdateUserRequest};
use super::repo::{NewUser, User};
use crate::error::{ApiError, FieldErrors};
use crate::validate::{
    age_in_years, contains_denylisted, replace_dollar_sign, sanitize_markup, slugify,
    USERNAME_DENYLIST,
};

const MIN_BIO_CHARS: usize = 20;
const MIN_AGE_YEARS: i32 = 15;

fn check_username(errors: &mut FieldErrors, value: &str) {
    if contains_denylisted(value, USERNAME_DENYLIST) {
        errors.push("username", "username must not contain these words");
    }
}

/// Length is checked on the raw value, before any markup is stripped.
fn check_bio(errors: &mut FieldErrors, value: &str) {
    if value.chars().count() < MIN_BIO_CHARS {
        errors.push("bio", "bio must be at least 20 characters");
    }
}

fn check_birthdate(errors: &mut FieldErrors, value: NaiveDate, today: NaiveDate) {
    if age_in_years(value, today) < MIN_AGE_YEARS {
        errors.push("birthdate", "user must be at least 15 years old");
    }
}

pub fn validate_new_user(req: &CreateUserRequest, today: NaiveDate) -> Result<(), ApiError> {
    let mut errors = FieldErrors::default();
    if req.username.trim().is_empty() {
        errors.push("username", "this field may not be blank");
    }
    check_username(&mut errors, &req.username);
    if req.password.is_empty() {
        errors.push("password", "this field may not be blank");
    }
    if let Some(bio) = req.bio.as_deref() {
        check_bio(&mut errors, bio);
    }
    if let Some(birthdate) = req.birthdate {
        check_birthdate(&mut errors, birthdate, today);
    }
    errors.into_result()
}

pub fn validate_user_update(req: &UpdateUserRequest, today: NaiveDate) -> Result<(), ApiError> {
    let mut errors = FieldErrors::default();
    if let Some(username) = req.username.as_deref() {
        check_username(&mut errors, username);
    }
    if let Some(bio) = req.bio.as_deref() {
        check_bio(&mut errors, bio);
    }
    if let Some(birthdate) = req.birthdate {
        check_birthdate(&mut errors, birthdate, today);
    }
    errors.into_result()
}

/// Sanitize, run the historical `$` pass-through, then slugify. The
/// slugification after sanitization is a compatibility contract, not an
/// accident to clean up.
pub fn normalized_bio(raw: &str) -> String {
    slugify(&replace_dollar_sign(sanitize_markup(raw)))
}

/// Builds the insert-ready record. Callers run `validate_new_user` first.
pub fn prepare_new_user(req: CreateUserRequest, password_hash: String) -> NewUser {
    NewUser {
        username: slugify(&req.username),
        password_hash,
        first_name: req.first_name.unwrap_or_default(),
        last_name: req.last_name.unwrap_or_default(),
        email: req.email.unwrap_or_default(),
        sex: req.sex,
        birthdate: req.birthdate,
        bio: req.bio.as_deref().map(normalized_bio),
    }
}

/// Folds the provided fields into an existing row, normalizing as on
/// create. The password is handled by the caller (it needs hashing).
pub fn merge_user_update(user: &mut User, req: UpdateUserRequest) {
    if let Some(username) = req.username {
        user.username = slugify(&username);
    }
    if let Some(first_name) = req.first_name {
        user.first_name = first_name;
    }
    if let Some(last_name) = req.last_name {
        user.last_name = last_name;
    }
    if let Some(email) = req.email {
        user.email = email;
    }
    if let Some(sex) = req.sex {
        user.sex = Some(sex);
    }
    if let Some(birthdate) = req.birthdate {
        user.birthdate = Some(birthdate);
    }
    if let Some(bio) = req.bio {
        user.bio = Some(normalized_bio(&bio));
    }
}
