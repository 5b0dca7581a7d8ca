//! Error types for the LinguaTech API client.
//!
//! # Design
//! `NotFound` gets a dedicated variant because callers distinguish "the
//! resource does not exist" from other failures (a repeated delete must end
//! there). All other non-2xx responses land in `Http` with the raw status,
//! body and, when the body is one, the parsed error envelope. The type is
//! `Clone` so every reader sharing a deduplicated request receives its own
//! copy of the outcome.

use validator::ValidationErrors;

use crate::http::HttpResponse;
use crate::types::ErrorEnvelope;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("resource not found")]
    NotFound { body: String },

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {}", display_message(.envelope, .body))]
    Http {
        status: u16,
        body: String,
        envelope: Option<ErrorEnvelope>,
    },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request aborted")]
    Aborted,

    /// A payload failed its schema before any request was sent.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// A session operation needed a token the store does not hold.
    #[error("no active session")]
    Unauthenticated,

    #[error("invalid configuration: {0}")]
    Config(String),

    /// A cache key was read back as a different type than it was stored as.
    #[error("cache entry {0} holds a different type")]
    CacheType(String),
}

fn display_message(envelope: &Option<ErrorEnvelope>, body: &str) -> String {
    match envelope {
        Some(envelope) if !envelope.message.is_empty() => envelope.message.clone(),
        _ => body.to_string(),
    }
}

impl ApiError {
    /// Map a non-2xx response to `NotFound` or `Http`.
    pub fn from_response(response: &HttpResponse) -> Self {
        let body = response.text();
        if response.status == 404 {
            return ApiError::NotFound { body };
        }
        let envelope = serde_json::from_str::<ErrorEnvelope>(&body).ok();
        ApiError::Http {
            status: response.status,
            body,
            envelope,
        }
    }

    /// HTTP status for errors that came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound { .. } => Some(404),
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// A message fit for a user-facing notification: the backend's envelope
    /// message when there is one, else the error's display text.
    pub fn message(&self) -> String {
        match self {
            ApiError::Http { envelope, body, .. } => display_message(envelope, body),
            ApiError::NotFound { body } => serde_json::from_str::<ErrorEnvelope>(body)
                .map(|e| e.message)
                .unwrap_or_else(|_| self.to_string()),
            other => other.to_string(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn not_found_is_its_own_class() {
        let err = ApiError::from_response(&response(404, ""));
        assert!(err.is_not_found());
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn http_error_keeps_status_body_and_envelope() {
        let body = r#"{"message":"Email already taken","succeeded":false,"code":409}"#;
        let err = ApiError::from_response(&response(409, body));
        match &err {
            ApiError::Http { status, body: raw, envelope } => {
                assert_eq!(*status, 409);
                assert_eq!(raw, body);
                assert_eq!(envelope.as_ref().unwrap().code, Some(409));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.message(), "Email already taken");
        assert_eq!(err.to_string(), "HTTP 409: Email already taken");
    }

    #[test]
    fn http_error_without_envelope_uses_raw_body() {
        let err = ApiError::from_response(&response(502, "bad gateway"));
        assert_eq!(err.message(), "bad gateway");
        assert!(!err.is_transport());
    }

    #[test]
    fn not_found_message_prefers_envelope() {
        let err = ApiError::from_response(&response(404, r#"{"message":"User not found"}"#));
        assert_eq!(err.message(), "User not found");
        let bare = ApiError::from_response(&response(404, ""));
        assert_eq!(bare.message(), "resource not found");
    }
}
