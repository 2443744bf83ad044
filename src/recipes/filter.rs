use std::collections::HashMap;

use sqlx::{QueryBuilder, Sqlite};

use super::repo::MealType;
use crate::filters::{limit_param, push_text_match, text_matches, TextMatch};

/// Translates the recipe list's query parameters into a SELECT joined
/// with the owning user. Recognized keys: `title` and `description`
/// (with `__exact`/`__contains`/`__startswith`), `chef` (contains-match
/// on the chef's username), `meal_type`. `limit` is handled by the
/// caller as a post-filter, not here.
pub fn build_recipe_query(params: &HashMap<String, String>) -> QueryBuilder<'static, Sqlite> {
    let mut qb = QueryBuilder::new(
        "SELECT r.id, r.chef_id, u.username AS chef_username, r.title, r.description, \
         r.meal_type, r.ingredients, r.image, r.created_at \
         FROM recipes r JOIN users u ON u.id = r.chef_id WHERE 1 = 1",
    );
    for m in text_matches(params, "title") {
        push_text_match(&mut qb, "r.title", &m);
    }
    for m in text_matches(params, "description") {
        push_text_match(&mut qb, "r.description", &m);
    }
    if let Some(chef) = params.get("chef") {
        push_text_match(&mut qb, "u.username", &TextMatch::Contains(chef.clone()));
    }
    if let Some(meal_type) = params.get("meal_type").and_then(|v| MealType::from_code(v)) {
        qb.push(" AND r.meal_type = ").push_bind(meal_type);
    }
    qb.push(" ORDER BY r.id");
    qb
}

pub fn recipe_limit(params: &HashMap<String, String>) -> Option<usize> {
    limit_param(params)
}
