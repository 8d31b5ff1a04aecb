use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::Timestamp;

/// Role assigned to a user account, gating which dashboard subtree the
/// user may access.
///
/// Serialized upper-case on the wire (`"ADMIN"`); parsed
/// case-insensitively because the backend is not consistent about the
/// casing it returns.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Admin,
    Developer,
    Buyer,
}

impl UserRole {
    /// Return the canonical string representation expected by the backend.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Developer => "DEVELOPER",
            Self::Buyer => "BUYER",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.eq_ignore_ascii_case("admin") {
            Ok(Self::Admin)
        } else if value.eq_ignore_ascii_case("developer") {
            Ok(Self::Developer)
        } else if value.eq_ignore_ascii_case("buyer") {
            Ok(Self::Buyer)
        } else {
            Err("unknown user role")
        }
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

/// Represents a user of the marketplace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier for the user.
    pub id: String,

    /// The user's email address, used as the login identifier.
    pub email: String,

    /// The user's display name.
    pub name: String,

    /// The user's role.
    pub role: UserRole,

    /// Whether the account is active. Display-only on the client.
    #[serde(default = "default_active")]
    pub active: bool,

    /// Organization the user belongs to. Empty for non-buyer roles.
    #[serde(default)]
    pub organization: String,

    /// Optional contact phone number.
    #[serde(default)]
    pub phone_number: String,

    /// When the user was created.
    pub created_at: Timestamp,

    /// When the user was last updated.
    pub updated_at: Timestamp,
}

fn default_active() -> bool {
    true
}

/// Fields a user may change on their own profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdateData {
    /// New display name, if changing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// New organization, if changing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,

    /// New phone number, if changing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}
