//! Query-parameter parsing shared by the user and recipe list endpoints.
//!
//! A flat `name -> value` map is translated into an AND-composed set of
//! predicates. Unrecognized parameter names are ignored, as are values
//! that fail to parse for a recognized name.

use std::collections::HashMap;

use chrono::NaiveDate;
use sqlx::{QueryBuilder, Sqlite};

/// One text predicate against a column, selected by the `__exact` /
/// `__contains` / `__startswith` suffix; the bare field name means exact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextMatch {
    Exact(String),
    Contains(String),
    StartsWith(String),
}

/// Collects every recognized lookup for `field` present in the query map.
pub fn text_matches(params: &HashMap<String, String>, field: &str) -> Vec<TextMatch> {
    let mut out = Vec::new();
    if let Some(v) = params.get(field) {
        out.push(TextMatch::Exact(v.clone()));
    }
    if let Some(v) = params.get(&format!("{field}__exact")) {
        out.push(TextMatch::Exact(v.clone()));
    }
    if let Some(v) = params.get(&format!("{field}__contains")) {
        out.push(TextMatch::Contains(v.clone()));
    }
    if let Some(v) = params.get(&format!("{field}__startswith")) {
        out.push(TextMatch::StartsWith(v.clone()));
    }
    out
}

pub fn date_param(params: &HashMap<String, String>, key: &str) -> Option<NaiveDate> {
    params.get(key).and_then(|v| v.parse().ok())
}

pub fn limit_param(params: &HashMap<String, String>) -> Option<usize> {
    params.get("limit").and_then(|v| v.parse().ok())
}

/// Escapes LIKE wildcards so user input matches literally.
pub fn like_escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

pub fn push_text_match(qb: &mut QueryBuilder<'static, Sqlite>, column: &str, m: &TextMatch) {
    qb.push(" AND ").push(column);
    match m {
        TextMatch::Exact(v) => {
            qb.push(" = ").push_bind(v.clone());
        }
        TextMatch::Contains(v) => {
            qb.push(" LIKE ")
                .push_bind(format!("%{}%", like_escape(v)))
                .push(" ESCAPE '\\'");
        }
        TextMatch::StartsWith(v) => {
            qb.push(" LIKE ")
                .push_bind(format!("{}%", like_escape(v)))
                .push(" ESCAPE '\\'");
        }
    }
}
