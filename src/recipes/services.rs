//! Write pipeline for the recipes resource. Checks accumulate across
//! fields; normalization then runs in the fixed compatibility order:
//! slugify title, slugify description, sanitize description, normalize
//! the image last.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use super::dto::{CreateRecipeRequest, UpdateRecipeRequest};
use super::repo::{NewRecipe, Recipe};
use crate::error::{ApiError, FieldErrors};
use crate::images;
use crate::validate::{contains_denylisted, sanitize_markup, slugify, TITLE_DENYLIST};

const MIN_DESCRIPTION_CHARS: usize = 20;

fn check_title(errors: &mut FieldErrors, value: &str) {
    if contains_denylisted(value, TITLE_DENYLIST) {
        errors.push("title", "title must not contain these words");
    }
}

/// Length is checked on the raw value, before any transform.
fn check_description(errors: &mut FieldErrors, value: &str) {
    if value.chars().count() < MIN_DESCRIPTION_CHARS {
        errors.push(
            "description",
            "description must be at least 20 characters long",
        );
    }
}

/// Slugify first, sanitize after. The slug has already flattened any
/// markup into plain hyphenated text by the time the sanitizer runs;
/// that ordering is the compatibility contract for stored descriptions.
pub fn normalized_description(raw: &str) -> String {
    sanitize_markup(&slugify(raw))
}

fn decode_image_field(b64: &str) -> Result<Vec<u8>, ApiError> {
    let bytes = BASE64
        .decode(b64)
        .map_err(|_| ApiError::field("image", "invalid base64 data"))?;
    images::normalize_image(&bytes)
        .map_err(|_| ApiError::field("image", "could not be decoded as an image"))
}

pub fn prepare_new_recipe(req: CreateRecipeRequest, chef_id: i64) -> Result<NewRecipe, ApiError> {
    let mut errors = FieldErrors::default();
    check_title(&mut errors, &req.title);
    check_description(&mut errors, &req.description);
    errors.into_result()?;

    let image = req.image.as_deref().map(decode_image_field).transpose()?;
    Ok(NewRecipe {
        chef_id,
        title: slugify(&req.title),
        description: normalized_description(&req.description),
        meal_type: req.meal_type,
        ingredients: req.ingredients.unwrap_or_default(),
        image,
    })
}

pub fn validate_recipe_update(req: &UpdateRecipeRequest) -> Result<(), ApiError> {
    let mut errors = FieldErrors::default();
    if let Some(title) = req.title.as_deref() {
        check_title(&mut errors, title);
    }
    if let Some(description) = req.description.as_deref() {
        check_description(&mut errors, description);
    }
    errors.into_result()
}

/// Folds the provided fields into an existing row, normalizing as on
/// create. Callers run `validate_recipe_update` first.
pub fn merge_recipe_update(recipe: &mut Recipe, req: UpdateRecipeRequest) -> Result<(), ApiError> {
    if let Some(title) = req.title {
        recipe.title = slugify(&title);
    }
    if let Some(description) = req.description {
        recipe.description = normalized_description(&description);
    }
    if let Some(meal_type) = req.meal_type {
        recipe.meal_type = meal_type;
    }
    if let Some(ingredients) = req.ingredients {
        recipe.ingredients = ingredients;
    }
    if let Some(image) = req.image.as_deref() {
        recipe.image = Some(decode_image_field(image)?);
    }
    Ok(())
}
