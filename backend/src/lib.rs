use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Access-control core.
pub mod guard;
pub mod roles;
pub mod session;
pub mod shell;

// Application services and page handlers.
pub mod accounts;
pub mod config;
pub mod handlers;
pub mod tickets;

// Router trees per access tier (public, admin, agent, client, shared).
pub mod routes;
use routes::{admin, agent, client, public, shared};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use guard::{Decision, RouteGuard, authorize};
pub use roles::{Role, RoleSet};
pub use session::{Session, SessionCodec, SessionProvider};
pub use tickets::{HttpTicketApi, MockTicketApi, TicketApiState};

/// ApiDoc
///
/// OpenAPI document for the JSON endpoints, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::get_session, handlers::authorize),
    components(schemas(handlers::SessionSummary, handlers::AuthorizeResponse, Decision, Role)),
    tags((name = "support-desk", description = "Support Desk portal session API"))
)]
struct ApiDoc;

/// AppState
///
/// Shared, immutable services handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Signs and verifies session cookies.
    pub sessions: SessionCodec,
    /// Client for the external ticket API.
    pub tickets: TicketApiState,
    pub config: AppConfig,
}

impl AppState {
    /// Builds the state for `config`, talking to the ticket API over HTTP.
    pub fn from_config(config: AppConfig) -> Self {
        let sessions = SessionCodec::new(&config.session_secret, config.session_ttl_secs);
        let tickets = std::sync::Arc::new(HttpTicketApi::new(&config.ticket_api_url)) as TicketApiState;
        Self {
            sessions,
            tickets,
            config,
        }
    }
}

impl FromRef<AppState> for SessionCodec {
    fn from_ref(app_state: &AppState) -> SessionCodec {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for TicketApiState {
    fn from_ref(app_state: &AppState) -> TicketApiState {
        app_state.tickets.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// Wraps `tree` in the route guard admitting `required`.
fn guarded(tree: Router<AppState>, state: &AppState, required: RoleSet) -> Router<AppState> {
    tree.route_layer(middleware::from_fn_with_state(
        RouteGuard::new(state.sessions.clone(), required),
        guard::route_guard,
    ))
}

/// create_router
///
/// Assembles the route trees, attaches each protected tree's guard, and applies the
/// observability layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(guarded(admin::admin_routes(), &state, admin::required_roles()))
        .merge(guarded(agent::agent_routes(), &state, agent::required_roles()))
        .merge(guarded(client::client_routes(), &state, client::required_roles()))
        .merge(guarded(shared::shared_routes(), &state, shared::required_roles()))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Opens the per-request span, tagged with the `x-request-id` set by the layer above.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
