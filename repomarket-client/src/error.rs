use reqwest::StatusCode;
use thiserror::Error;

/// Normalized failure surfaced by every client operation.
///
/// Lower-level failures (transport errors, malformed JSON) never leak
/// past the HTTP client; they are folded into one of these variants, and
/// `Display` yields the message shown to the user.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A client-side precondition failed before any request was sent.
    #[error("{0}")]
    Validation(String),

    /// The backend rejected the credentials or revoked the session (401).
    #[error("Invalid credentials")]
    Unauthorized,

    /// The backend denied access to the resource (403).
    #[error("Access denied")]
    Forbidden,

    /// The backend failed internally (5xx).
    #[error("Server error occurred. Please check server logs.")]
    Server,

    /// No response reached the server at all.
    #[error("No response from server. Please check your connection.")]
    Network,

    /// The request ran past the configured timeout.
    #[error("Request timed out. Please try again.")]
    Timeout,

    /// The backend reported a failure with its own message.
    #[error("{0}")]
    Api(String),

    /// The response body did not match any expected shape.
    #[error("Invalid response format from server")]
    Malformed,

    /// The underlying HTTP client could not be constructed.
    #[error("failed to initialize HTTP client: {0}")]
    Init(String),
}

impl ApiError {
    /// Whether retrying the same request may succeed without any other
    /// change. True only for transport-level failures.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::Timeout)
    }

    /// Classify a transport-level `reqwest` failure.
    pub(crate) fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network
        }
    }

    /// Map a non-2xx status (other than 401/403, which are handled
    /// globally) to the error surfaced to the caller.
    pub(crate) fn from_status(status: StatusCode, message: Option<String>) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized,
            StatusCode::FORBIDDEN => Self::Forbidden,
            status if status.is_server_error() => Self::Server,
            _ => Self::Api(message.unwrap_or_else(|| "An unexpected error occurred".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_failures_are_retryable() {
        assert!(ApiError::Network.is_retryable());
        assert!(ApiError::Timeout.is_retryable());
        assert!(!ApiError::Unauthorized.is_retryable());
        assert!(!ApiError::Server.is_retryable());
    }

    #[test]
    fn server_errors_use_generic_message() {
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, Some("boom".to_string()));
        assert!(matches!(err, ApiError::Server));
        assert_eq!(
            err.to_string(),
            "Server error occurred. Please check server logs."
        );
    }

    #[test]
    fn other_statuses_surface_backend_message() {
        let err = ApiError::from_status(StatusCode::CONFLICT, Some("email taken".to_string()));
        assert_eq!(err.to_string(), "email taken");
    }

    #[test]
    fn other_statuses_fall_back_to_generic_message() {
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, None);
        assert_eq!(err.to_string(), "An unexpected error occurred");
    }

    #[test]
    fn network_message_tells_user_to_check_connection() {
        assert_eq!(
            ApiError::Network.to_string(),
            "No response from server. Please check your connection."
        );
        assert_eq!(
            ApiError::Timeout.to_string(),
            "Request timed out. Please try again."
        );
    }
}
