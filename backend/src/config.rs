use std::env;

const LOCAL_SESSION_SECRET: &str = "local-session-secret-change-me";
const DEFAULT_TICKET_API_URL: &str = "http://localhost:8000/api/v1";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60 * 8;

/// AppConfig
///
/// Immutable runtime configuration, read once at startup and shared through `AppState`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls cookie hardening and the sign-up simulation.
    pub env: Env,
    // Secret used to sign and verify session cookies.
    pub session_secret: String,
    // Lifetime of a freshly issued session, in seconds.
    pub session_ttl_secs: u64,
    // Base URL of the external ticket API (no trailing slash).
    pub ticket_api_url: String,
    // Address the HTTP server binds to.
    pub bind_addr: String,
}

/// Env
///
/// Local development or hardened production deployment.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Safe values for tests; no environment variables are read.
    fn default() -> Self {
        Self {
            env: Env::Local,
            session_secret: LOCAL_SESSION_SECRET.to_string(),
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            ticket_api_url: DEFAULT_TICKET_API_URL.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from the environment.
    ///
    /// # Panics
    /// In production, panics when `SESSION_SECRET` or `TICKET_API_URL` is missing.
    /// In any environment, panics when `SESSION_TTL_SECS` is set but is not a positive
    /// integer. A misconfigured portal must not start.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let session_ttl_secs = match env::var("SESSION_TTL_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|ttl| *ttl > 0)
                .expect("FATAL: SESSION_TTL_SECS must be a positive integer"),
            Err(_) => DEFAULT_SESSION_TTL_SECS,
        };

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        match env {
            Env::Local => Self {
                env,
                session_secret: env::var("SESSION_SECRET")
                    .unwrap_or_else(|_| LOCAL_SESSION_SECRET.to_string()),
                session_ttl_secs,
                ticket_api_url: trim_base(
                    env::var("TICKET_API_URL").unwrap_or_else(|_| DEFAULT_TICKET_API_URL.to_string()),
                ),
                bind_addr,
            },
            Env::Production => Self {
                env,
                session_secret: env::var("SESSION_SECRET")
                    .expect("FATAL: SESSION_SECRET must be set in production."),
                session_ttl_secs,
                ticket_api_url: trim_base(
                    env::var("TICKET_API_URL")
                        .expect("FATAL: TICKET_API_URL must be set in production."),
                ),
                bind_addr,
            },
        }
    }

    /// Whether cookies must carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.env == Env::Production
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
