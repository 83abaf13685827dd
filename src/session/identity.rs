//! Authenticated identity and role model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Staff role reported by the backend.
///
/// Variants are ordered from most to least privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access, including user management, monitoring and audit logs.
    Superadmin,
    /// Catalog and order administration.
    Admin,
    /// Day-to-day store operations.
    Manager,
}

impl Role {
    /// Every role, most privileged first.
    pub const ALL: [Role; 3] = [Role::Superadmin, Role::Admin, Role::Manager];

    /// Role assumed for an identity that carries no role field.
    pub const LOWEST: Role = Role::Manager;

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Superadmin => "superadmin",
            Self::Admin => "admin",
            Self::Manager => "manager",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "superadmin" => Ok(Self::Superadmin),
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// The staff member a session belongs to.
///
/// The backend historically used both `_id` and `id`, so both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(alias = "_id")]
    pub id: String,
    pub username: String,
    #[serde(default, deserialize_with = "empty_role_as_none")]
    pub role: Option<Role>,
}

impl Identity {
    /// Role used for gating. A missing role is treated as [`Role::LOWEST`].
    #[must_use]
    pub fn effective_role(&self) -> Role {
        self.role.unwrap_or(Role::LOWEST)
    }
}

fn empty_role_as_none<'de, D>(deserializer: D) -> Result<Option<Role>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(name) => name.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// A bearer token together with the identity it was issued to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub identity: Identity,
}
