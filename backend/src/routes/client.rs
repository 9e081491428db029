use crate::{
    AppState, handlers,
    roles::{Role, RoleSet},
};
use axum::{Router, routing::get};

/// Client Router Module
///
/// Views for customers: their tickets, unread responses, and the ticket creation form.
pub fn client_routes() -> Router<AppState> {
    Router::new()
        .route("/client/dashboard", get(handlers::dashboard))
        .route("/client/tickets", get(handlers::section))
        // GET/POST /client/tickets/new
        // Form page, and its submission relayed to the ticket API.
        .route(
            handlers::NEW_TICKET_PATH,
            get(handlers::new_ticket_page).post(handlers::create_ticket),
        )
        .route("/client/unread", get(handlers::section))
}

pub fn required_roles() -> RoleSet {
    RoleSet::only(Role::Client)
}
