//! Gateway error types with numeric error codes.
//!
//! [`GatewayError`] is the central error type for the gateway. Session
//! handlers return it, and the connection loop converts it into an
//! [`ErrorBody`] sent back to the originating connection only.

use serde::Serialize;

use crate::domain::ConnectionId;

/// Error payload carried by the outbound `error` event.
///
/// ```json
/// {
///   "code": 1003,
///   "message": "identity resolution failed: email is malformed",
///   "event": "user_start_typing"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    /// Numeric error code (see [`GatewayError`] code ranges).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Inbound event that triggered the failure, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
}

/// Server-side error enum.
///
/// # Error Code Ranges
///
/// | Range     | Category        |
/// |-----------|-----------------|
/// | 1000–1999 | Validation      |
/// | 2000–2999 | Session state   |
/// | 3000–3999 | Server          |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Inbound payload did not match the schema of its event.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Inbound event name is not part of the protocol.
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    /// Registration claim (fullname, email) is empty or malformed.
    #[error("identity resolution failed: {0}")]
    IdentityResolution(String),

    /// The connection sent an identity-dependent event before registering.
    #[error("connection {0} has no identity mapping")]
    UnmappedConnection(ConnectionId),

    /// Document or user store is unavailable or rejected the write.
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidPayload(_) => 1001,
            Self::UnknownEvent(_) => 1002,
            Self::IdentityResolution(_) => 1003,
            Self::UnmappedConnection(_) => 2001,
            Self::Persistence(_) => 3001,
        }
    }

    /// Builds the client-facing error body, tagged with the inbound event
    /// name that failed.
    #[must_use]
    pub fn to_body(&self, event: Option<&str>) -> ErrorBody {
        ErrorBody {
            code: self.error_code(),
            message: self.to_string(),
            event: event.map(str::to_string),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_ranges() {
        assert_eq!(GatewayError::InvalidPayload("x".into()).error_code(), 1001);
        assert_eq!(
            GatewayError::UnmappedConnection(ConnectionId::new()).error_code(),
            2001
        );
        assert_eq!(GatewayError::Persistence("down".into()).error_code(), 3001);
    }

    #[test]
    fn every_variant_has_a_distinct_code() {
        let codes = [
            GatewayError::InvalidPayload(String::new()).error_code(),
            GatewayError::UnknownEvent(String::new()).error_code(),
            GatewayError::IdentityResolution(String::new()).error_code(),
            GatewayError::UnmappedConnection(ConnectionId::new()).error_code(),
            GatewayError::Persistence(String::new()).error_code(),
        ];
        let unique: std::collections::HashSet<u32> = codes.iter().copied().collect();
        assert_eq!(unique.len(), codes.len());
        assert_eq!(codes, [1001, 1002, 1003, 2001, 3001]);
    }

    #[test]
    fn body_carries_event_name() {
        let err = GatewayError::Persistence("db unavailable".into());
        let body = err.to_body(Some("save-document"));
        assert_eq!(body.code, 3001);
        assert_eq!(body.event.as_deref(), Some("save-document"));
        assert!(body.message.contains("db unavailable"));
    }

    #[test]
    fn body_omits_missing_event() {
        let body = GatewayError::UnknownEvent("nope".into()).to_body(None);
        let Ok(json) = serde_json::to_value(&body) else {
            panic!("serialization failed");
        };
        assert!(json.get("event").is_none());
        assert_eq!(json.get("code"), Some(&serde_json::json!(1002)));
    }
}
