use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Standard response wrapper used by most backend endpoints.
///
/// Endpoints are inconsistent: some wrap their payload as
/// `{status, data: {...}}`, some return the payload flat, and the auth
/// endpoints may return a bare token string. [`decode`] handles all
/// three shapes in one place.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Envelope<T> {
    /// `"success"` or `"error"`.
    #[serde(default)]
    pub status: Option<String>,

    /// Legacy success flag sent by some endpoints.
    #[serde(default)]
    pub success: Option<bool>,

    /// Human-readable message, usually present on failures.
    #[serde(default)]
    pub message: Option<String>,

    /// The wrapped payload.
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Whether the envelope itself reports a failure, regardless of the
    /// HTTP status the response arrived with.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        self.status.as_deref() == Some("error") || self.success == Some(false)
    }
}

/// Failure modes of [`decode`].
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The envelope parsed but reports a failure; carries the backend
    /// message when one was sent.
    #[error("{0}")]
    Rejected(String),

    /// The body matches neither the envelope nor the bare payload shape.
    #[error("invalid response body: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Decode a response body that may or may not be wrapped in an
/// [`Envelope`].
///
/// The envelope shape is tried first; when it matches and carries a
/// `data` field, the inner payload is returned. Otherwise the whole body
/// is parsed as `T`, which also covers auth endpoints that return the
/// token as a bare JSON string.
///
/// # Errors
/// Returns [`DecodeError::Rejected`] when the envelope reports a failure
/// and [`DecodeError::Invalid`] when no shape matches.
pub fn decode<T: DeserializeOwned>(body: &str) -> Result<T, DecodeError> {
    if let Ok(envelope) = serde_json::from_str::<Envelope<T>>(body) {
        if envelope.is_rejected() {
            return Err(DecodeError::Rejected(envelope.message.unwrap_or_else(
                || "An unexpected error occurred".to_string(),
            )));
        }
        if let Some(data) = envelope.data {
            return Ok(data);
        }
    }
    Ok(serde_json::from_str::<T>(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuthPayload;

    #[test]
    fn decodes_wrapped_payload() {
        let body = r#"{"status":"success","data":{"userId":"u1","name":"Ann","role":"DEVELOPER","token":"tok1"}}"#;
        let payload: AuthPayload = decode(body).unwrap();

        assert_eq!(payload.user_id.as_deref(), Some("u1"));
        assert_eq!(payload.token, "tok1");
    }

    #[test]
    fn decodes_flat_payload() {
        let body = r#"{"userId":"u1","name":"Ann","role":"DEVELOPER","token":"tok1"}"#;
        let payload: AuthPayload = decode(body).unwrap();

        assert_eq!(payload.token, "tok1");
    }

    #[test]
    fn passes_bare_string_through() {
        let token: String = decode("\"tok-raw\"").unwrap();

        assert_eq!(token, "tok-raw");
    }

    #[test]
    fn surfaces_envelope_rejection_message() {
        let body = r#"{"status":"error","message":"email already registered"}"#;
        let result: Result<AuthPayload, _> = decode(body);

        match result {
            Err(DecodeError::Rejected(message)) => {
                assert_eq!(message, "email already registered");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn surfaces_legacy_success_flag_rejection() {
        let body = r#"{"success":false,"message":"Registration failed"}"#;
        let result: Result<AuthPayload, _> = decode(body);

        assert!(matches!(result, Err(DecodeError::Rejected(_))));
    }

    #[test]
    fn missing_data_field_is_invalid() {
        let body = r#"{"status":"success","data":null}"#;
        let result: Result<AuthPayload, _> = decode(body);

        assert!(matches!(result, Err(DecodeError::Invalid(_))));
    }
}
