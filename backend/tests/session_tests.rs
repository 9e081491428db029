use axum::http::{HeaderMap, HeaderValue, header};
use jsonwebtoken::{EncodingKey, Header, encode};
use support_desk::{
    Role, SessionCodec, SessionProvider,
    session::{CookieSessionReader, Session, SessionClaims, SessionRole},
};
use std::time::SystemTime;
use uuid::Uuid;

const TEST_SECRET: &str = "session-test-secret";

fn now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn headers_with(cookie: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
    headers
}

#[test]
fn test_issued_token_reads_back() {
    let codec = SessionCodec::new(TEST_SECRET, 600);
    let mut session = Session::new(Uuid::new_v4(), "agent@example.com", Role::Agent);
    session.api_token = Some("api-123".to_string());

    let token = codec.issue(&session).unwrap();
    let headers = headers_with(&format!("lang=en; support_session={token}"));

    assert_eq!(
        CookieSessionReader::new(&headers, &codec).read_session(),
        Some(session)
    );
}

#[test]
fn test_reading_is_idempotent() {
    let codec = SessionCodec::new(TEST_SECRET, 600);
    let token = codec
        .issue(&Session::new(Uuid::new_v4(), "client@example.com", Role::Client))
        .unwrap();
    let headers = headers_with(&format!("support_session={token}"));
    let reader = CookieSessionReader::new(&headers, &codec);

    assert_eq!(reader.read_session(), reader.read_session());
}

#[test]
fn test_expired_token_is_absent() {
    let codec = SessionCodec::new(TEST_SECRET, 600);
    let session = Session::new(Uuid::new_v4(), "admin@example.com", Role::Admin);
    let token = codec.issue_at(&session, now() - 7200, now() - 3600).unwrap();

    let headers = headers_with(&format!("support_session={token}"));
    assert_eq!(CookieSessionReader::new(&headers, &codec).read_session(), None);
}

#[test]
fn test_token_signed_with_other_secret_is_absent() {
    let forger = SessionCodec::new("not-the-server-secret", 600);
    let codec = SessionCodec::new(TEST_SECRET, 600);
    let token = forger
        .issue(&Session::new(Uuid::new_v4(), "admin@example.com", Role::Admin))
        .unwrap();

    let headers = headers_with(&format!("support_session={token}"));
    assert_eq!(CookieSessionReader::new(&headers, &codec).read_session(), None);
}

#[test]
fn test_unknown_role_claim_is_kept_as_unrecognized() {
    let codec = SessionCodec::new(TEST_SECRET, 600);
    let claims = SessionClaims {
        sub: Uuid::from_u128(42),
        email: "x@example.com".to_string(),
        role: "superuser".to_string(),
        api_token: None,
        iat: now(),
        exp: now() + 600,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap();

    let session = codec.decode(&token).unwrap();
    assert_eq!(session.role, SessionRole::Unrecognized("superuser".to_string()));
    assert_eq!(session.role.known(), None);
}

#[test]
fn test_token_missing_claims_is_rejected() {
    #[derive(serde::Serialize)]
    struct Partial {
        sub: Uuid,
        exp: u64,
    }

    let codec = SessionCodec::new(TEST_SECRET, 600);
    let token = encode(
        &Header::default(),
        &Partial {
            sub: Uuid::nil(),
            exp: now() + 600,
        },
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap();

    assert!(codec.decode(&token).is_err());
}

#[test]
fn test_no_cookie_header_is_absent() {
    let codec = SessionCodec::new(TEST_SECRET, 600);
    let headers = HeaderMap::new();
    assert_eq!(CookieSessionReader::new(&headers, &codec).read_session(), None);
}
