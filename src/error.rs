//! Gateway error types with HTTP status code mapping.
//!
//! [`RealtimeError`] is the central error type for both halves of the
//! crate: the server-side gateway maps each variant to an HTTP status
//! and structured JSON body, while the client session layer returns the
//! same variants from [`connect`](crate::client::ConnectionManager::connect)
//! and [`send`](crate::client::ConnectionManager::send).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::domain::EventKind;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "invalid credential: blank session token",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges below).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Error enum shared by the gateway and the client session layer.
///
/// # Error Code Ranges
///
/// | Range     | Category          | HTTP Status                |
/// |-----------|-------------------|----------------------------|
/// | 1000–1999 | Validation        | 400 / 401 / 422            |
/// | 2000–2999 | Connection state  | 409 Conflict / 502         |
/// | 3000–3999 | Server            | 500 Internal Server Error  |
/// | 4000–4999 | Dispatch          | 500 Internal Server Error  |
#[derive(Debug, thiserror::Error)]
pub enum RealtimeError {
    /// Session credential is missing or blank. Fatal to the `connect()`
    /// call that produced it; never retried automatically.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// A wire frame or its payload could not be decoded.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// A structurally valid intent was rejected (empty chat text,
    /// foreign room join, oversized payload).
    #[error("invalid intent: {0}")]
    InvalidIntent(String),

    /// `send()` was called while the connection is not in the
    /// `Connected` state. Nothing was transmitted or buffered.
    #[error("not connected")]
    NotConnected,

    /// Transient transport-level failure. Surfaced through connection
    /// state transitions and retried with backoff, never thrown at
    /// unrelated callers.
    #[error("connection failed: {0}")]
    Connection(String),

    /// A subscriber callback panicked during dispatch. Isolated and
    /// logged; later callbacks in the same dispatch still run.
    #[error("subscriber panicked during {kind} dispatch")]
    Subscriber {
        /// Event kind that was being dispatched.
        kind: EventKind,
    },

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RealtimeError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidCredential(_) => 1001,
            Self::MalformedFrame(_) => 1002,
            Self::InvalidIntent(_) => 1003,
            Self::NotConnected => 2001,
            Self::Connection(_) => 2002,
            Self::Internal(_) => 3000,
            Self::Subscriber { .. } => 4001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidCredential(_) => StatusCode::UNAUTHORIZED,
            Self::MalformedFrame(_) => StatusCode::BAD_REQUEST,
            Self::InvalidIntent(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotConnected => StatusCode::CONFLICT,
            Self::Connection(_) => StatusCode::BAD_GATEWAY,
            Self::Subscriber { .. } | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RealtimeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn invalid_credential_maps_to_unauthorized() {
        let err = RealtimeError::InvalidCredential("blank session token".to_string());
        assert_eq!(err.error_code(), 1001);
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn not_connected_maps_to_conflict() {
        let err = RealtimeError::NotConnected;
        assert_eq!(err.error_code(), 2001);
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn subscriber_message_names_the_kind() {
        let err = RealtimeError::Subscriber {
            kind: EventKind::ChatMessage,
        };
        assert!(err.to_string().contains("chat-message"));
    }

    #[test]
    fn error_body_serializes_without_details() {
        let body = ErrorResponse {
            error: ErrorBody {
                code: 1002,
                message: "malformed frame: bad json".to_string(),
                details: None,
            },
        };
        let json = serde_json::to_string(&body).unwrap_or_default();
        assert!(json.contains("1002"));
        assert!(!json.contains("details"));
    }
}
