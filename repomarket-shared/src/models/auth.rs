use serde::{Deserialize, Serialize};

use super::{User, UserRole};

/// Request body for `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    /// The user's email address.
    pub email: String,

    /// The user's password.
    pub password: String,

    /// Role the user claims to log in as. Sent upper-case when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
}

/// Request body for `POST /auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// The user's email address.
    pub email: String,

    /// The user's password.
    pub password: String,

    /// The user's display name.
    pub name: String,

    /// Requested role for the new account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,

    /// Organization the account belongs to. Required for buyers.
    pub organization: String,

    /// Optional contact phone number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// Inner payload of a successful login or register response.
///
/// The backend omits `userId` and `name` in some deployments; the client
/// synthesizes them locally when absent.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    /// Identifier of the authenticated user, when the backend sends one.
    #[serde(default)]
    pub user_id: Option<String>,

    /// Display name of the authenticated user, when the backend sends one.
    #[serde(default)]
    pub name: Option<String>,

    /// Role the backend established for the session.
    pub role: UserRole,

    /// Bearer token for subsequent requests.
    pub token: String,
}

/// A fully established session as returned by login and register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResponse {
    /// Bearer token for subsequent requests.
    pub token: String,

    /// The authenticated user.
    pub user: User,
}

/// Client-side registration input.
///
/// Accepts `organization` or the `company_name` alias collected by the
/// sign-up form; the alias is mapped onto `organization` before
/// transmission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterData {
    /// The user's email address.
    pub email: String,

    /// The user's password.
    pub password: String,

    /// The user's display name.
    pub name: String,

    /// Requested role for the new account.
    pub role: Option<UserRole>,

    /// Organization the account belongs to.
    pub organization: Option<String>,

    /// Alias for `organization` used by the sign-up form.
    pub company_name: Option<String>,

    /// Optional contact phone number.
    pub phone_number: Option<String>,
}

impl RegisterData {
    /// Resolve the organization, preferring `organization` over the
    /// `company_name` alias.
    #[must_use]
    pub fn resolved_organization(&self) -> String {
        self.organization
            .clone()
            .filter(|value| !value.trim().is_empty())
            .or_else(|| {
                self.company_name
                    .clone()
                    .filter(|value| !value.trim().is_empty())
            })
            .unwrap_or_default()
    }
}

/// Input collected by the sign-up form, which asks for a company name
/// rather than an organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpData {
    /// The user's display name.
    pub name: String,

    /// The user's email address.
    pub email: String,

    /// The user's password.
    pub password: String,

    /// Requested role for the new account.
    pub role: UserRole,

    /// Company name, mapped to the organization field on registration.
    pub company_name: Option<String>,

    /// Optional contact phone number.
    pub phone_number: Option<String>,
}

impl From<SignUpData> for RegisterData {
    fn from(data: SignUpData) -> Self {
        Self {
            email: data.email,
            password: data.password,
            name: data.name,
            role: Some(data.role),
            organization: None,
            company_name: data.company_name,
            phone_number: data.phone_number,
        }
    }
}
