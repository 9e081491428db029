use crate::{
    accounts::{self, LoginForm, RegisterForm},
    config::AppConfig,
    guard::{self, AuthorizedSession, Decision, LOGIN_PATH},
    roles::{Role, RoleSet},
    session::{CookieSessionReader, Session, SessionCodec, SessionProvider},
    shell::{self, LayoutShell, escape, nav_items},
    tickets::{TicketApiState, TicketForm},
};
use axum::{
    Extension, Form, Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, Uri, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

// --- Query & Response Structs ---

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// AuthorizeQuery
///
/// Query parameters for `GET /api/authorize`.
#[derive(Debug, Deserialize, IntoParams)]
pub struct AuthorizeQuery {
    /// Comma-separated role names, e.g. `admin,agent`. Missing or blank means no role.
    pub roles: Option<String>,
}

/// SessionSummary
///
/// What scripted clients may learn about the current session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionSummary {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthorizeResponse {
    pub decision: Decision,
}

// --- Public Pages ---

/// home
///
/// Landing page. Signed-in visitors get a link to their dashboard.
pub async fn home(State(sessions): State<SessionCodec>, headers: HeaderMap) -> Html<String> {
    let session = CookieSessionReader::new(&headers, &sessions).read_session();
    let actions = match session.as_ref().and_then(|s| s.role.known()) {
        Some(role) => format!(
            r#"<a class="button" href="{}">Go to your dashboard</a>"#,
            role.home_path()
        ),
        None => r#"<a class="button" href="/login">Sign in</a> <a class="button" href="/register">Sign up</a>"#
            .to_string(),
    };

    shell::document(
        "Home",
        &format!(
            r#"<section class="hero"><h1>Where AI Meets Customer Support</h1><div class="actions">{actions}</div></section>"#
        ),
    )
}

pub async fn login_page(Query(query): Query<NextQuery>) -> Html<String> {
    login_view(None, "", guard::safe_next(query.next.as_deref()))
}

/// login
///
/// Checks the posted credentials, stores the session cookie and sends the visitor to
/// the page they were heading for, or to their role's dashboard.
pub async fn login(
    State(sessions): State<SessionCodec>,
    State(config): State<AppConfig>,
    Form(form): Form<LoginForm>,
) -> Response {
    let next = guard::safe_next(form.next.as_deref());
    match accounts::login(&form) {
        Ok(session) => {
            tracing::info!(email = %session.email, "signed in");
            start_session(&sessions, &config, &session, next)
        }
        Err(e) => {
            tracing::debug!(error = %e, "sign-in refused");
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                login_view(Some(&e.to_string()), &form.email, next),
            )
                .into_response()
        }
    }
}

pub async fn register_page() -> Html<String> {
    register_view(None, &RegisterForm::default())
}

/// register
///
/// Validates the sign-up form, then signs the new account in.
pub async fn register(
    State(sessions): State<SessionCodec>,
    State(config): State<AppConfig>,
    Form(form): Form<RegisterForm>,
) -> Response {
    match accounts::register(&form, config.env) {
        Ok(session) => {
            tracing::info!(email = %session.email, "registered");
            start_session(&sessions, &config, &session, None)
        }
        Err(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            register_view(Some(&e.to_string()), &form),
        )
            .into_response(),
    }
}

/// logout
///
/// Clears the session cookie. The next guarded navigation is sent to sign-in.
pub async fn logout(State(sessions): State<SessionCodec>, State(config): State<AppConfig>) -> Response {
    (
        [(header::SET_COOKIE, sessions.clear_cookie(config.secure_cookies()).to_string())],
        Redirect::to("/"),
    )
        .into_response()
}

/// denied
///
/// Shown after the guard refuses a signed-in visitor whose role is not admitted.
pub async fn denied() -> (StatusCode, Html<String>) {
    (
        StatusCode::FORBIDDEN,
        shell::document(
            "Access Denied",
            r#"<div class="denied"><h1>Access Denied</h1><p>You don't have permission to access this page.</p><a class="button" href="/">Go Home</a></div>"#,
        ),
    )
}

// --- Guarded Pages ---

/// dashboard
///
/// Landing view of each role tree: a greeting and shortcuts to the role's sections.
pub async fn dashboard(Extension(session): Extension<AuthorizedSession>) -> Html<String> {
    let shortcuts: String = nav_items(session.role)
        .iter()
        .filter(|item| item.path != session.role.home_path())
        .map(|item| {
            format!(
                r#"<li><a href="{}">{}</a></li>"#,
                escape(item.path),
                escape(item.label)
            )
        })
        .collect();

    let content = format!(
        r#"<h1>{} Dashboard</h1><p>Welcome back, {}.</p><ul class="shortcuts">{shortcuts}</ul>"#,
        session.role.label(),
        escape(&session.email),
    );

    LayoutShell::for_session(&session).render("Dashboard", session.role.home_path(), &content)
}

/// section
///
/// Any navigation target of a role tree whose data is fetched from the ticket API by
/// the browser. The portal renders the frame and an empty mount point.
pub async fn section(Extension(session): Extension<AuthorizedSession>, uri: Uri) -> Html<String> {
    let path = uri.path();
    let title = nav_items(session.role)
        .iter()
        .find(|item| item.path == path)
        .map(|item| item.label)
        .unwrap_or("Overview");

    let content = format!(
        r#"<h1>{title}</h1><div class="data-view" data-source="{}"></div>"#,
        escape(path)
    );

    LayoutShell::for_session(&session).render(title, path, &content)
}

/// settings
///
/// Account overview, reachable from every role's navigation.
pub async fn settings(Extension(session): Extension<AuthorizedSession>) -> Html<String> {
    let content = format!(
        r#"<h1>Settings</h1><dl><dt>Email</dt><dd>{}</dd><dt>Role</dt><dd>{}</dd><dt>User ID</dt><dd>{}</dd></dl>"#,
        escape(&session.email),
        session.role.label(),
        session.user_id,
    );
    LayoutShell::for_session(&session).render("Settings", shell::SETTINGS_PATH, &content)
}

pub const NEW_TICKET_PATH: &str = "/client/tickets/new";
const CLIENT_TICKETS_PATH: &str = "/client/tickets";

pub async fn new_ticket_page(Extension(session): Extension<AuthorizedSession>) -> Html<String> {
    ticket_view(&session, None, &TicketForm::default())
}

/// create_ticket
///
/// Validates the form and relays it to the ticket API. On success the visitor lands on
/// their ticket list; otherwise the form comes back with their input and the reason.
pub async fn create_ticket(
    State(tickets): State<TicketApiState>,
    Extension(session): Extension<AuthorizedSession>,
    Form(form): Form<TicketForm>,
) -> Response {
    let ticket = match form.validate() {
        Ok(ticket) => ticket,
        Err(e) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                ticket_view(&session, Some(&e.to_string()), &form),
            )
                .into_response();
        }
    };

    match tickets
        .create_ticket(&ticket, session.api_token.as_deref())
        .await
    {
        Ok(_) => Redirect::to(CLIENT_TICKETS_PATH).into_response(),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            ticket_view(&session, Some(&e.to_string()), &form),
        )
            .into_response(),
    }
}

// --- JSON API ---

/// get_session
///
/// Returns the current session, 401 when there is none, 403 when it names an unknown role.
#[utoipa::path(
    get,
    path = "/api/session",
    responses(
        (status = 200, description = "Current session", body = SessionSummary),
        (status = 401, description = "No session"),
        (status = 403, description = "Session role not recognised")
    )
)]
pub async fn get_session(
    State(sessions): State<SessionCodec>,
    headers: HeaderMap,
) -> Result<Json<SessionSummary>, StatusCode> {
    let session = CookieSessionReader::new(&headers, &sessions)
        .read_session()
        .ok_or(StatusCode::UNAUTHORIZED)?;
    let role = session.role.known().ok_or(StatusCode::FORBIDDEN)?;

    Ok(Json(SessionSummary {
        user_id: session.user_id,
        email: session.email,
        role,
    }))
}

/// authorize
///
/// Evaluates the route guard for an arbitrary role set against the caller's session.
/// Unknown role names are rejected with 400.
#[utoipa::path(
    get,
    path = "/api/authorize",
    params(AuthorizeQuery),
    responses(
        (status = 200, description = "Guard decision", body = AuthorizeResponse),
        (status = 400, description = "Unknown role name")
    )
)]
pub async fn authorize(
    State(sessions): State<SessionCodec>,
    headers: HeaderMap,
    Query(query): Query<AuthorizeQuery>,
) -> Result<Json<AuthorizeResponse>, StatusCode> {
    let required = RoleSet::parse_list(query.roles.as_deref().unwrap_or("")).map_err(|e| {
        tracing::debug!(error = %e, "authorize query rejected");
        StatusCode::BAD_REQUEST
    })?;

    let decision = guard::authorize(&required, &CookieSessionReader::new(&headers, &sessions));
    Ok(Json(AuthorizeResponse { decision }))
}

// --- Helpers ---

fn start_session(
    sessions: &SessionCodec,
    config: &AppConfig,
    session: &Session,
    next: Option<&str>,
) -> Response {
    let token = match sessions.issue(session) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(error = %e, "failed to sign session");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let landing = next
        .or_else(|| session.role.known().map(Role::home_path))
        .unwrap_or("/");

    (
        [(header::SET_COOKIE, sessions.cookie(&token, config.secure_cookies()).to_string())],
        Redirect::to(landing),
    )
        .into_response()
}

fn error_line(error: Option<&str>) -> String {
    error
        .map(|e| format!(r#"<p class="error" role="alert">{}</p>"#, escape(e)))
        .unwrap_or_default()
}

fn login_view(error: Option<&str>, email: &str, next: Option<&str>) -> Html<String> {
    let next_field = next
        .map(|n| format!(r#"<input type="hidden" name="next" value="{}">"#, escape(n)))
        .unwrap_or_default();

    shell::document(
        "Login",
        &format!(
            r#"<h1>Login</h1><form method="post" action="{LOGIN_PATH}">{next_field}
<label for="email">Email:</label><input id="email" name="email" type="email" value="{}" required>
<label for="password">Password:</label><input id="password" name="password" type="password" required>
{}<button type="submit">Login</button></form>
<p>Don't have an account? <a href="/register">Register here</a></p>"#,
            escape(email),
            error_line(error),
        ),
    )
}

fn register_view(error: Option<&str>, form: &RegisterForm) -> Html<String> {
    shell::document(
        "Register",
        &format!(
            r#"<h1>Register</h1><form method="post" action="/register">
<label for="first_name">First Name:</label><input id="first_name" name="first_name" value="{}" required>
<label for="family_name">Family Name:</label><input id="family_name" name="family_name" value="{}" required>
<label for="email">Email:</label><input id="email" name="email" type="email" value="{}" required>
<label for="password">Password:</label><input id="password" name="password" type="password" minlength="{}" required>
{}<button type="submit">Register</button></form>
<p>Already have an account? <a href="/login">Login here</a></p>"#,
            escape(&form.first_name),
            escape(&form.family_name),
            escape(&form.email),
            accounts::MIN_PASSWORD_LEN,
            error_line(error),
        ),
    )
}

fn ticket_view(session: &AuthorizedSession, error: Option<&str>, form: &TicketForm) -> Html<String> {
    let content = format!(
        r#"<h1>Create New Ticket</h1><form method="post" action="{NEW_TICKET_PATH}">
<label for="subject">Subject *</label><input id="subject" name="subject" value="{}" required>
<label for="problem_date">Date of the problem *</label><input id="problem_date" name="problem_date" type="date" value="{}" required>
<label for="description">Description *</label><textarea id="description" name="description" rows="5" required>{}</textarea>
{}<a href="{CLIENT_TICKETS_PATH}">Cancel</a> <button type="submit">Create Ticket</button></form>"#,
        escape(&form.subject),
        escape(&form.problem_date),
        escape(&form.description),
        error_line(error),
    );
    LayoutShell::for_session(session).render("New Ticket", NEW_TICKET_PATH, &content)
}
