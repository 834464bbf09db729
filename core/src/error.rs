//! Error types for the transit API client.
//!
//! # Design
//! Every failure a caller can see carries a human-readable message, because
//! the host shows `err.to_string()` directly. Non-2xx responses keep the
//! status next to the message so callers can still branch on it.

use thiserror::Error;

use crate::http::HttpResponse;

/// Errors returned by `Call::parse`, `ApiClient` and the feature managers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The transport did not answer within the configured timeout.
    #[error("Request timeout")]
    Timeout,

    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The transport could not complete the round-trip.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The operation needs a logged-in user.
    #[error("not logged in")]
    NotAuthenticated,

    /// A client-side rule rejected the input before any request was sent.
    #[error("{0}")]
    Validation(String),

    /// Session storage could not be read or written.
    #[error("storage failed: {0}")]
    Storage(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    /// Build the error for a non-2xx response.
    ///
    /// The message is the body's `error` field, then its `message` field,
    /// then `HTTP <status>`. Empty strings count as absent.
    pub fn from_response(response: &HttpResponse) -> Self {
        let message = server_message(&response.body)
            .unwrap_or_else(|| format!("HTTP {}", response.status));
        ApiError::Http {
            status: response.status,
            message,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Timeout)
    }
}

fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["error", "message"].iter().find_map(|field| {
        value
            .get(field)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_field_wins_over_message() {
        let response = HttpResponse::new(500, r#"{"error":"db down","message":"ignored"}"#);
        let err = ApiError::from_response(&response);
        assert_eq!(err.to_string(), "db down");
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn message_field_is_used_without_error() {
        let response = HttpResponse::new(401, r#"{"message":"Invalid credentials"}"#);
        assert_eq!(ApiError::from_response(&response).to_string(), "Invalid credentials");
    }

    #[test]
    fn empty_error_falls_through_to_message() {
        let response = HttpResponse::new(400, r#"{"error":"","message":"Seat already reserved"}"#);
        assert_eq!(ApiError::from_response(&response).to_string(), "Seat already reserved");
    }

    #[test]
    fn non_json_body_reports_status() {
        let response = HttpResponse::new(502, "<html>bad gateway</html>");
        let err = ApiError::from_response(&response);
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn json_without_known_fields_reports_status() {
        let response = HttpResponse::new(404, r#"{"detail":"nope"}"#);
        let err = ApiError::from_response(&response);
        assert_eq!(err.to_string(), "HTTP 404");
        assert!(err.is_not_found());
    }

    #[test]
    fn timeout_message() {
        assert_eq!(ApiError::Timeout.to_string(), "Request timeout");
        assert!(ApiError::Timeout.is_timeout());
    }
}
