use crate::{
    AppState, handlers,
    roles::{Role, RoleSet},
};
use axum::{Router, routing::get};

/// Agent Router Module
///
/// Queue views for support agents.
pub fn agent_routes() -> Router<AppState> {
    Router::new()
        .route("/agent/dashboard", get(handlers::dashboard))
        .route("/agent/tickets", get(handlers::section))
        .route("/agent/unread", get(handlers::section))
        .route("/agent/overdue", get(handlers::section))
        .route("/agent/resolved", get(handlers::section))
}

pub fn required_roles() -> RoleSet {
    RoleSet::only(Role::Agent)
}
