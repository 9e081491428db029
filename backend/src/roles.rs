use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;

/// Role
///
/// The closed set of identities the portal knows about. Every role-valued variable
/// in the crate is one of these three; there is no fallback or "guest" variant.
/// The wire form (cookie claims, JSON, query strings) is the lowercase name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    Agent,
    Client,
}

/// UnknownRole
///
/// Raised when a string does not name one of the registered roles.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role: {0:?}")]
pub struct UnknownRole(pub String);

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Agent, Role::Client];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Agent => "agent",
            Role::Client => "client",
        }
    }

    /// Human-readable label used in page chrome.
    pub fn label(self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Agent => "Agent",
            Role::Client => "Client",
        }
    }

    /// Landing page after sign-in.
    pub fn home_path(self) -> &'static str {
        match self {
            Role::Admin => "/admin/dashboard",
            Role::Agent => "/agent/dashboard",
            Role::Client => "/client/dashboard",
        }
    }

    fn bit(self) -> u8 {
        match self {
            Role::Admin => 0b001,
            Role::Agent => 0b010,
            Role::Client => 0b100,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "agent" => Ok(Role::Agent),
            "client" => Ok(Role::Client),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// RoleSet
///
/// The set of roles a route tree admits. Built once when the router is assembled.
/// An empty set admits nobody.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoleSet(u8);

impl RoleSet {
    pub const fn empty() -> Self {
        RoleSet(0)
    }

    pub fn all() -> Self {
        Self::of(Role::ALL)
    }

    pub fn only(role: Role) -> Self {
        RoleSet(role.bit())
    }

    pub fn of(roles: impl IntoIterator<Item = Role>) -> Self {
        roles.into_iter().collect()
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        Role::ALL.into_iter().filter(|role| self.contains(*role))
    }

    /// Parses a comma-separated list such as `admin,agent`. Blank entries are skipped;
    /// an unknown name fails the whole list.
    pub fn parse_list(list: &str) -> Result<Self, UnknownRole> {
        list.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(Role::from_str)
            .collect()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        RoleSet(iter.into_iter().fold(0, |bits, role| bits | role.bit()))
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(Role::as_str).collect();
        write!(f, "[{}]", names.join(","))
    }
}
