use shared::models::UserRole;

use crate::session::Session;

/// Route of the login page, the target for unauthenticated access and
/// revoked sessions.
pub const LOGIN_ROUTE: &str = "/login";

/// Route of the authenticated home page, the target for wrong-role
/// access.
pub const HOME_ROUTE: &str = "/home";

/// Route of the access-denied page, the target for 403 responses.
pub const FORBIDDEN_ROUTE: &str = "/forbidden";

/// Outcome of evaluating access to a role-restricted subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Session checks passed; render the protected content.
    Render,

    /// Session state is still being established; render a placeholder
    /// rather than redirecting.
    Loading,

    /// Access refused; navigate to the carried route.
    Redirect(&'static str),
}

/// Decide what to do with a navigation into a subtree requiring
/// `required`.
///
/// Pure function of its inputs, re-evaluated on every navigation. An
/// authenticated user with the wrong role is bounced to their own home
/// page, not the forbidden page; only the backend's 403 reaches that
/// one. Role comparison is case-insensitive end to end because
/// [`UserRole`] parses any casing the backend sends into one canonical
/// variant.
#[must_use]
pub fn evaluate(required: UserRole, session: &Session) -> RouteDecision {
    if session.is_loading {
        return RouteDecision::Loading;
    }
    if !session.is_authenticated {
        return RouteDecision::Redirect(LOGIN_ROUTE);
    }
    match &session.user {
        Some(user) if user.role == required => RouteDecision::Render,
        _ => RouteDecision::Redirect(HOME_ROUTE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::User;

    fn user_with_role_json(role: &str) -> User {
        let json = format!(
            r#"{{
                "id": "u1",
                "email": "a@b.com",
                "name": "Ann",
                "role": "{role}",
                "createdAt": "2025-03-08T14:30:00Z",
                "updatedAt": "2025-03-08T14:30:00Z"
            }}"#
        );
        serde_json::from_str(&json).unwrap()
    }

    fn authenticated_session(role: &str) -> Session {
        Session {
            user: Some(user_with_role_json(role)),
            token: Some("tok1".to_string()),
            is_authenticated: true,
            is_loading: false,
        }
    }

    #[test]
    fn loading_session_renders_placeholder() {
        let session = Session {
            is_loading: true,
            ..Session::default()
        };

        assert_eq!(evaluate(UserRole::Admin, &session), RouteDecision::Loading);
    }

    #[test]
    fn unauthenticated_session_redirects_to_login() {
        let session = Session::default();

        assert_eq!(
            evaluate(UserRole::Developer, &session),
            RouteDecision::Redirect(LOGIN_ROUTE)
        );
    }

    #[test]
    fn matching_role_renders() {
        let session = authenticated_session("ADMIN");

        assert_eq!(evaluate(UserRole::Admin, &session), RouteDecision::Render);
    }

    #[test]
    fn role_comparison_is_case_insensitive() {
        for role in ["admin", "Admin", "ADMIN"] {
            let session = authenticated_session(role);
            assert_eq!(
                evaluate(UserRole::Admin, &session),
                RouteDecision::Render,
                "role casing {role:?} should be admitted"
            );
        }
    }

    #[test]
    fn wrong_role_redirects_to_home_not_login() {
        let session = authenticated_session("BUYER");

        assert_eq!(
            evaluate(UserRole::Admin, &session),
            RouteDecision::Redirect(HOME_ROUTE)
        );
    }

    #[test]
    fn wrong_role_never_reaches_forbidden() {
        let session = authenticated_session("DEVELOPER");

        let decision = evaluate(UserRole::Buyer, &session);
        assert_ne!(decision, RouteDecision::Redirect(FORBIDDEN_ROUTE));
        assert_eq!(decision, RouteDecision::Redirect(HOME_ROUTE));
    }

    #[test]
    fn loading_takes_precedence_over_role_checks() {
        let mut session = authenticated_session("BUYER");
        session.is_loading = true;

        assert_eq!(evaluate(UserRole::Admin, &session), RouteDecision::Loading);
    }
}
