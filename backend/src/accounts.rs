//! Simulated sign-in and sign-up.
//!
//! The portal has no identity provider of its own. Until one is wired in, these rules
//! decide which role a visitor receives; the resulting session is then handled exactly
//! like one minted by a real provider.

use serde::Deserialize;
use uuid::Uuid;

use crate::{config::Env, roles::Role, session::Session};

pub const MIN_PASSWORD_LEN: usize = 6;

const DEMO_ACCOUNTS: [(&str, Role); 3] = [
    ("admin@example.com", Role::Admin),
    ("agent@example.com", Role::Agent),
    ("client@example.com", Role::Client),
];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// Page the visitor was sent away from, if any.
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub family_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Why a sign-in or sign-up attempt was refused. The `Display` text is shown to the visitor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountError {
    #[error("Please fill in all fields")]
    MissingFields,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Password must be at least 6 characters")]
    PasswordTooShort,
}

/// Checks a sign-in attempt against the demo directory.
pub fn login(form: &LoginForm) -> Result<Session, AccountError> {
    let email = form.email.trim();
    if email.is_empty() || form.password.is_empty() {
        return Err(AccountError::MissingFields);
    }

    let role = DEMO_ACCOUNTS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(email))
        .map(|(_, role)| *role)
        .ok_or(AccountError::InvalidCredentials)?;

    Ok(Session::new(Uuid::new_v4(), email.to_ascii_lowercase(), role))
}

/// Validates a sign-up and decides the new account's role.
///
/// Locally the role follows the email address so each dashboard can be reached while
/// developing. In production every self-registered account is a client.
pub fn register(form: &RegisterForm, env: Env) -> Result<Session, AccountError> {
    let email = form.email.trim();
    if form.first_name.trim().is_empty()
        || form.family_name.trim().is_empty()
        || email.is_empty()
        || form.password.is_empty()
    {
        return Err(AccountError::MissingFields);
    }
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AccountError::PasswordTooShort);
    }

    let role = match env {
        Env::Local => role_from_email(email),
        Env::Production => Role::Client,
    };

    Ok(Session::new(Uuid::new_v4(), email.to_ascii_lowercase(), role))
}

fn role_from_email(email: &str) -> Role {
    let email = email.to_ascii_lowercase();
    if email.contains("admin") {
        Role::Admin
    } else if email.contains("agent") {
        Role::Agent
    } else {
        Role::Client
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionRole;

    fn login_form(email: &str, password: &str) -> LoginForm {
        LoginForm {
            email: email.to_string(),
            password: password.to_string(),
            next: None,
        }
    }

    fn register_form(email: &str, password: &str) -> RegisterForm {
        RegisterForm {
            first_name: "Ada".to_string(),
            family_name: "Lovelace".to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn demo_accounts_map_to_roles() {
        for (email, role) in DEMO_ACCOUNTS {
            let session = login(&login_form(email, "pw")).unwrap();
            assert_eq!(session.role, SessionRole::Known(role));
            assert_eq!(session.email, email);
        }
    }

    #[test]
    fn login_rejects_blank_and_unknown() {
        assert_eq!(login(&login_form("", "pw")), Err(AccountError::MissingFields));
        assert_eq!(
            login(&login_form("admin@example.com", "")),
            Err(AccountError::MissingFields)
        );
        assert_eq!(
            login(&login_form("someone@example.com", "pw")),
            Err(AccountError::InvalidCredentials)
        );
    }

    #[test]
    fn register_validates_fields() {
        let mut form = register_form("a@b.c", "secret");
        form.first_name.clear();
        assert_eq!(register(&form, Env::Local), Err(AccountError::MissingFields));
        assert_eq!(
            register(&register_form("a@b.c", "12345"), Env::Local),
            Err(AccountError::PasswordTooShort)
        );
    }

    #[test]
    fn register_role_depends_on_env() {
        let form = register_form("support-agent@corp.io", "secret");
        assert_eq!(
            register(&form, Env::Local).unwrap().role,
            SessionRole::Known(Role::Agent)
        );
        assert_eq!(
            register(&form, Env::Production).unwrap().role,
            SessionRole::Known(Role::Client)
        );
        assert_eq!(
            register(&register_form("Head.Admin@corp.io", "secret"), Env::Local)
                .unwrap()
                .role,
            SessionRole::Known(Role::Admin)
        );
    }
}
