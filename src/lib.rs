pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod filters;
pub mod images;
pub mod policy;
pub mod recipes;
pub mod state;
pub mod users;
pub mod validate;
