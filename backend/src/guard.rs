use axum::{
    extract::{Request, State},
    http::Uri,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    roles::{Role, RoleSet},
    session::{CookieSessionReader, Session, SessionCodec, SessionProvider},
};

pub const LOGIN_PATH: &str = "/login";
pub const DENIED_PATH: &str = "/denied";

/// Characters kept verbatim in the `next` query value: unreserved characters plus `/`,
/// so the remembered path stays readable.
const NEXT_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Decision
///
/// The outcome of gating one navigation against a route tree's required roles.
///
/// The three variants are exhaustive: there is no "partially authorized" state and no
/// error variant. Missing, expired or undecodable sessions are ordinary outcomes
/// (`RedirectToLogin`), as are signed-in visitors whose role is not admitted or not
/// recognised (`RedirectToDenied`). Only `Allow` lets guarded content render.
///
/// The serialized form (`allow`, `redirect_to_login`, `redirect_to_denied`) is what
/// `GET /api/authorize` returns and what the exported TypeScript binding describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Decision {
    Allow,
    RedirectToLogin,
    RedirectToDenied,
}

/// Gates a navigation against `required`, reading the session from `provider`.
///
/// Evaluated fresh on each call; nothing is cached between navigations.
pub fn authorize(required: &RoleSet, provider: &impl SessionProvider) -> Decision {
    authorize_session(required, provider.read_session().as_ref())
}

/// The pure three-way branch behind [`authorize`].
pub fn authorize_session(required: &RoleSet, session: Option<&Session>) -> Decision {
    let Some(session) = session else {
        return Decision::RedirectToLogin;
    };

    match session.role.known() {
        Some(role) if required.contains(role) => Decision::Allow,
        _ => Decision::RedirectToDenied,
    }
}

/// AuthorizedSession
///
/// A session that has passed the guard for the current route tree. Only the guard
/// middleware constructs it, so a handler receiving one knows the role is admitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedSession {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub api_token: Option<String>,
}

impl AuthorizedSession {
    fn admit(session: Session, role: Role) -> Self {
        Self {
            user_id: session.user_id,
            email: session.email,
            role,
            api_token: session.api_token,
        }
    }
}

/// RouteGuard
///
/// The protected-route descriptor: the pairing of a required `RoleSet` with the codec
/// used to read the visitor's session.
///
/// One guard is built per route tree in `create_router` and attached with
/// `middleware::from_fn_with_state` + `route_layer`, so it runs only for routes that
/// matched and before any of the tree's handlers or body extractors. The descriptor is
/// immutable after construction; every request is evaluated against the same role set
/// and a freshly read session.
///
/// Layout shells and handlers behind the guard never re-check the role. They receive
/// an `AuthorizedSession` from request extensions, which only this guard inserts.
#[derive(Clone)]
pub struct RouteGuard {
    sessions: SessionCodec,
    required: RoleSet,
}

impl RouteGuard {
    pub fn new(sessions: SessionCodec, required: RoleSet) -> Self {
        Self { sessions, required }
    }
}

/// route_guard
///
/// Middleware run before every handler of a protected tree.
///
/// - Allow: the `AuthorizedSession` is placed in request extensions and the request proceeds.
/// - RedirectToLogin: `303 See Other` to `/login?next=<requested path>`.
/// - RedirectToDenied: `303 See Other` to `/denied`.
pub async fn route_guard(
    State(guard): State<RouteGuard>,
    mut request: Request,
    next: Next,
) -> Response {
    let reader = CookieSessionReader::new(request.headers(), &guard.sessions);
    let session = reader.read_session();
    let decision = authorize_session(&guard.required, session.as_ref());

    tracing::debug!(
        path = %request.uri().path(),
        required = %guard.required,
        ?decision,
        "route guard evaluated"
    );

    match (decision, session) {
        (Decision::Allow, Some(session)) => {
            let Some(role) = session.role.known() else {
                return Redirect::to(DENIED_PATH).into_response();
            };
            request
                .extensions_mut()
                .insert(AuthorizedSession::admit(session, role));
            next.run(request).await
        }
        (Decision::RedirectToDenied, _) => Redirect::to(DENIED_PATH).into_response(),
        _ => Redirect::to(&login_redirect(request.uri())).into_response(),
    }
}

/// Builds the sign-in URL, remembering where the visitor was heading.
pub fn login_redirect(requested: &Uri) -> String {
    let target = requested
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    format!("{LOGIN_PATH}?next={}", encode_query_value(target))
}

/// safe_next
///
/// Only same-site absolute paths are honoured as a post-login destination.
///
/// Browsers drop tabs and line breaks from URLs and treat `\\` like `/`, so a value
/// such as `/\t/evil.example` would become the protocol-relative `//evil.example`.
/// Any whitespace or control character, any backslash, and a leading `//` are refused
/// before the value is parsed; the parsed URI must then carry neither scheme nor
/// authority.
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    let next = next?;
    if !next.starts_with('/')
        || next.starts_with("//")
        || next.contains('\\')
        || next.chars().any(|c| c.is_control() || c.is_whitespace())
    {
        return None;
    }

    let uri: Uri = next.parse().ok()?;
    (uri.scheme().is_none() && uri.authority().is_none()).then_some(next)
}

fn encode_query_value(value: &str) -> String {
    utf8_percent_encode(value, NEXT_VALUE).to_string()
}
