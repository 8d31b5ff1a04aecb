use serde::{Deserialize, Serialize};

/// Error body returned by the backend on failed requests.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// `"error"` on the wire; tolerated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// The main error message.
    pub message: String,
}

impl ErrorResponse {
    /// Creates a new error response with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: Some("error".to_string()),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ErrorResponse {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_new() {
        let error = ErrorResponse::new("Test error");
        assert_eq!(error.message, "Test error");
        assert_eq!(error.status.as_deref(), Some("error"));
    }

    #[test]
    fn test_error_response_display() {
        let error = ErrorResponse::new("Simple error");
        assert_eq!(format!("{error}"), "Simple error");
    }

    #[test]
    fn test_error_response_deserialization() {
        let json = r#"{"status":"error","message":"Invalid credentials"}"#;
        let error: ErrorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(error.message, "Invalid credentials");
    }

    #[test]
    fn test_error_response_tolerates_missing_status() {
        let json = r#"{"message":"boom"}"#;
        let error: ErrorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(error.message, "boom");
        assert_eq!(error.status, None);
    }

    #[test]
    fn test_error_response_as_error() {
        let error = ErrorResponse::new("Error trait test");
        let error_trait: &dyn std::error::Error = &error;
        assert!(error_trait.to_string().contains("Error trait test"));
    }
}
