use axum::http::{HeaderMap, header};
use cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use thiserror::Error;
use uuid::Uuid;

use crate::roles::Role;

/// Name of the cookie holding the signed session token.
pub const SESSION_COOKIE: &str = "support_session";

/// SessionRole
///
/// The role carried by a decoded session. A token can be perfectly well signed and
/// still name a role this build does not know (an older deployment, a hand-edited
/// claim); that case is kept distinct so the guard can deny it explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionRole {
    Known(Role),
    Unrecognized(String),
}

impl SessionRole {
    pub fn known(&self) -> Option<Role> {
        match self {
            SessionRole::Known(role) => Some(*role),
            SessionRole::Unrecognized(_) => None,
        }
    }

    fn from_claim(raw: String) -> Self {
        match raw.parse::<Role>() {
            Ok(role) => SessionRole::Known(role),
            Err(_) => SessionRole::Unrecognized(raw),
        }
    }

    fn as_claim(&self) -> &str {
        match self {
            SessionRole::Known(role) => role.as_str(),
            SessionRole::Unrecognized(raw) => raw,
        }
    }
}

/// Session
///
/// The identity record the browser holds between requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
    pub role: SessionRole,
    /// Bearer token for the external ticket API, when the sign-in flow obtained one.
    pub api_token: Option<String>,
}

impl Session {
    pub fn new(user_id: Uuid, email: impl Into<String>, role: Role) -> Self {
        Self {
            user_id,
            email: email.into(),
            role: SessionRole::Known(role),
            api_token: None,
        }
    }
}

/// SessionClaims
///
/// The JWT payload stored in the session cookie. `role` stays a plain string on the
/// wire so that an unknown value decodes into `SessionRole::Unrecognized` rather than
/// failing the whole token.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub email: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: u64,
    /// Expiry, seconds since the Unix epoch. Checked by `jsonwebtoken` on every decode.
    pub exp: u64,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session token could not be signed: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),
    #[error("session token rejected: {0}")]
    Decode(#[source] jsonwebtoken::errors::Error),
}

/// SessionCodec
///
/// Signs and verifies session tokens (HS256) with the configured secret.
#[derive(Clone)]
pub struct SessionCodec {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
    ttl_secs: u64,
}

impl SessionCodec {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            encoding: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
            ttl_secs,
        }
    }

    /// Signs a token for `session`, valid for the codec's TTL from now.
    pub fn issue(&self, session: &Session) -> Result<String, SessionError> {
        let now = unix_now();
        self.issue_at(session, now, now + self.ttl_secs)
    }

    /// Signs a token with explicit timestamps.
    pub fn issue_at(
        &self,
        session: &Session,
        issued_at: u64,
        expires_at: u64,
    ) -> Result<String, SessionError> {
        let claims = SessionClaims {
            sub: session.user_id,
            email: session.email.clone(),
            role: session.role.as_claim().to_string(),
            api_token: session.api_token.clone(),
            iat: issued_at,
            exp: expires_at,
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(SessionError::Encode)
    }

    /// Verifies signature and expiry, then rebuilds the session.
    pub fn decode(&self, token: &str) -> Result<Session, SessionError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        validation.leeway = 0;

        let data = decode::<SessionClaims>(token, &self.decoding, &validation)
            .map_err(SessionError::Decode)?;
        let claims = data.claims;

        Ok(Session {
            user_id: claims.sub,
            email: claims.email,
            role: SessionRole::from_claim(claims.role),
            api_token: claims.api_token,
        })
    }

    /// cookie
    ///
    /// Builds the `Set-Cookie` value carrying `token`. The cookie is `HttpOnly` so page
    /// scripts cannot read the session, `SameSite=Lax` so it still accompanies top-level
    /// navigations from other sites, and lives exactly as long as the token it carries.
    pub fn cookie(&self, token: &str, secure: bool) -> Cookie<'static> {
        let max_age = i64::try_from(self.ttl_secs).unwrap_or(i64::MAX);
        Cookie::build((SESSION_COOKIE, token.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(secure)
            .max_age(CookieDuration::seconds(max_age))
            .build()
    }

    /// clear_cookie
    ///
    /// Builds the `Set-Cookie` value that removes the session from the browser: same
    /// name and path as [`SessionCodec::cookie`], empty value, zero lifetime.
    pub fn clear_cookie(&self, secure: bool) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, ""))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(secure)
            .max_age(CookieDuration::ZERO)
            .expires(cookie::time::OffsetDateTime::UNIX_EPOCH)
            .build()
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

/// SessionProvider
///
/// Source of the current session snapshot. The guard only ever sees this trait, so it
/// can be driven by the request's cookie jar in the server and by a fixed value in tests.
///
/// Implementations must be read-only: calling `read_session` twice yields the same result.
pub trait SessionProvider {
    fn read_session(&self) -> Option<Session>;
}

/// CookieSessionReader
///
/// The production `SessionProvider`: reads the session from the `Cookie` headers of a
/// single request.
///
/// The reader borrows the request headers and the shared codec, so building one per
/// request costs nothing and keeps no state between navigations. A logout or a role
/// change therefore takes effect on the very next request.
///
/// Failure handling is one-sided. A missing cookie, an empty value, an
/// unparsable `Cookie` header, a bad signature, an expired token or a payload with
/// missing claims are all reported as `None`, exactly like a visitor who never signed
/// in. Only a token that verifies produces a `Session`.
pub struct CookieSessionReader<'a> {
    headers: &'a HeaderMap,
    codec: &'a SessionCodec,
}

impl<'a> CookieSessionReader<'a> {
    pub fn new(headers: &'a HeaderMap, codec: &'a SessionCodec) -> Self {
        Self { headers, codec }
    }
}

impl SessionProvider for CookieSessionReader<'_> {
    fn read_session(&self) -> Option<Session> {
        let token = session_token(self.headers)?;
        match self.codec.decode(&token) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::debug!(error = %e, "discarding unreadable session cookie");
                None
            }
        }
    }
}

/// StaticSession
///
/// A provider that always returns the same snapshot.
#[derive(Debug, Clone, Default)]
pub struct StaticSession(pub Option<Session>);

impl SessionProvider for StaticSession {
    fn read_session(&self) -> Option<Session> {
        self.0.clone()
    }
}

/// session_token
///
/// Finds the session token among every `Cookie` header of the request. Header values
/// that are not visible ASCII, and pairs the `cookie` parser rejects, are skipped.
/// An empty value counts as no cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn finds_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; support_session=abc.def.ghi; lang=fr"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn finds_cookie_in_second_header() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(header::COOKIE, HeaderValue::from_static("support_session=tok"));
        assert_eq!(session_token(&headers).as_deref(), Some("tok"));
    }

    #[test]
    fn empty_or_missing_cookie_is_absent() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);

        headers.insert(header::COOKIE, HeaderValue::from_static("support_session="));
        assert_eq!(session_token(&headers), None);

        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark"));
        assert_eq!(session_token(&headers), None);
    }

    #[test]
    fn cookie_attributes() {
        let codec = SessionCodec::new("secret", 3600);
        let cookie = codec.cookie("tok", false);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "tok");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(CookieDuration::seconds(3600)));
        assert_ne!(cookie.secure(), Some(true));
        assert!(cookie.to_string().starts_with("support_session=tok;"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let codec = SessionCodec::new("secret", 3600);
        let cookie = codec.clear_cookie(true);
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(CookieDuration::ZERO));
        assert_eq!(cookie.secure(), Some(true));
        assert!(cookie.to_string().contains("Max-Age=0"));
    }

    #[test]
    fn far_future_expiry_is_kept_exactly() {
        let codec = SessionCodec::new("secret", 3600);
        let session = Session::new(Uuid::nil(), "a@example.com", Role::Admin);
        let far = u64::from(u32::MAX) + 3600;
        let token = codec.issue_at(&session, far - 7200, far).unwrap();
        assert_eq!(codec.decode(&token).unwrap(), session);
    }
}
