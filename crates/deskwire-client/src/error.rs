//! Errors surfaced to callers of the [`crate::ConnectionManager`].
//!
//! Receive-side failures (malformed frames, panicking callbacks, socket
//! errors seen by the receive loop) never appear here: they are logged and
//! the caller discovers a dead connection on its next send.

use deskwire_core::EncodeError;
use thiserror::Error;

use crate::application::resolve_session::SessionApiError;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The socket could not be opened, timed out, or a transmit failed.
    #[error("connection to {url} failed: {reason}")]
    ConnectionFailed { url: String, reason: String },

    /// No session could be obtained and the legacy endpoint was unreachable
    /// as well.
    #[error("no session available and legacy endpoint {url} failed: {reason}")]
    NoSessionAvailable { url: String, reason: String },

    /// The input intent itself is invalid; never retried.
    #[error("protocol violation: {0}")]
    ProtocolViolation(#[from] EncodeError),

    /// A wire message could not be rendered as JSON.
    #[error("failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The agent's session REST API rejected a call.
    #[error("session API error: {0}")]
    SessionApi(#[from] SessionApiError),
}

impl ClientError {
    pub(crate) fn connection_failed(url: &str, reason: impl ToString) -> Self {
        ClientError::ConnectionFailed {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// `true` for errors caused by the network rather than by the request.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            ClientError::ConnectionFailed { .. } | ClientError::NoSessionAvailable { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_error_converts_to_protocol_violation() {
        let err: ClientError = EncodeError::EmptyKeyCombo.into();
        assert!(matches!(err, ClientError::ProtocolViolation(EncodeError::EmptyKeyCombo)));
        assert!(!err.is_connection_error());
    }

    #[test]
    fn test_connection_failed_message_names_url() {
        let err = ClientError::connection_failed("ws://h:1/x", "timed out");
        assert_eq!(err.to_string(), "connection to ws://h:1/x failed: timed out");
        assert!(err.is_connection_error());
    }
}
