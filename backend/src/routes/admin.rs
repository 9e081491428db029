use crate::{
    AppState, handlers,
    roles::{Role, RoleSet},
};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Oversight views for administrators. The lists behind Users, Agents, Tickets and
/// Reports are loaded from the ticket API by the browser; this tree only serves the frame.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/dashboard", get(handlers::dashboard))
        .route("/admin/users", get(handlers::section))
        .route("/admin/agents", get(handlers::section))
        .route("/admin/tickets", get(handlers::section))
        .route("/admin/reports", get(handlers::section))
}

pub fn required_roles() -> RoleSet {
    RoleSet::only(Role::Admin)
}
