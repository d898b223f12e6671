//! HTTP route handlers.

pub mod api_keys;
pub mod auth;
pub mod health;
pub mod logs;
pub mod settings;
pub mod surveys;
pub mod templates;
pub mod users;
