use crate::{AppState, guard, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Sign-in, sign-up, the landing page, the denied page and the JSON API. None of these
/// render guarded content: the JSON API evaluates the guard itself and only reports the
/// decision.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for load balancers.
        .route("/health", get(|| async { "ok" }))
        .route("/", get(handlers::home))
        .route(
            guard::LOGIN_PATH,
            get(handlers::login_page).post(handlers::login),
        )
        .route(
            "/register",
            get(handlers::register_page).post(handlers::register),
        )
        // POST /logout
        // Clears the session cookie and returns to the landing page.
        .route("/logout", post(handlers::logout))
        .route(guard::DENIED_PATH, get(handlers::denied))
        // GET /api/session
        // The caller's session as JSON, for scripted clients.
        .route("/api/session", get(handlers::get_session))
        // GET /api/authorize?roles=admin,agent
        // Runs the route guard against the given role list.
        .route("/api/authorize", get(handlers::authorize))
}
