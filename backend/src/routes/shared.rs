use crate::{AppState, handlers, roles::RoleSet, shell};
use axum::{Router, routing::get};

/// Shared Router Module
///
/// Views linked from every role's navigation.
pub fn shared_routes() -> Router<AppState> {
    Router::new().route(shell::SETTINGS_PATH, get(handlers::settings))
}

pub fn required_roles() -> RoleSet {
    RoleSet::all()
}
