use crate::{auth::repo_types::User, config::AppConfig, state::AppState};
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod repo;
pub mod services;

/// True when either of the user's contacts is on the admin allow-list.
pub fn is_admin(config: &AppConfig, user: &User) -> bool {
    config.is_admin_contact(user.email.as_deref(), user.phone.as_deref())
}

pub fn router() -> Router<AppState> {
    handlers::router()
}
