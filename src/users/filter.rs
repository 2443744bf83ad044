use std::collections::HashMap;

use sqlx::{QueryBuilder, Sqlite};

use super::repo::Sex;
use crate::filters::{date_param, push_text_match, text_matches};

/// Translates the user list's query parameters into a single SELECT with
/// an AND-composed WHERE clause. Recognized keys: `username` and `bio`
/// (with `__exact`/`__contains`/`__startswith`), `dob_gte`, `dob_lte`,
/// `sex`. Everything else is ignored.
pub fn build_user_query(params: &HashMap<String, String>) -> QueryBuilder<'static, Sqlite> {
    let mut qb = QueryBuilder::new(
        "SELECT id, username, password_hash, first_name, last_name, email, \
         sex, birthdate, bio, is_staff, created_at FROM users WHERE 1 = 1",
    );
    for m in text_matches(params, "username") {
        push_text_match(&mut qb, "username", &m);
    }
    for m in text_matches(params, "bio") {
        push_text_match(&mut qb, "bio", &m);
    }
    if let Some(date) = date_param(params, "dob_gte") {
        qb.push(" AND birthdate >= ").push_bind(date);
    }
    if let Some(date) = date_param(params, "dob_lte") {
        qb.push(" AND birthdate <= ").push_bind(date);
    }
    if let Some(sex) = params.get("sex").and_then(|v| Sex::from_code(v)) {
        qb.push(" AND sex = ").push_bind(sex);
    }
    qb.push(" ORDER BY id");
    qb
}
