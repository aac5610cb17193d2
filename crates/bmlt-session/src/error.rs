//! Session error types.

use thiserror::Error;

use bmlt_transport::TransportError;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Reasons an operation is refused before any request is issued.
///
/// Failures that happen on the wire are reported as events, not as these.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The handshake has not completed.
    #[error("Session is not ready")]
    NotReady,

    /// Another request is still in flight.
    #[error("A request is already in flight")]
    Busy,

    /// The operation needs an admin login.
    #[error("Not logged in as an administrator")]
    NotLoggedIn,

    /// The server does not offer the admin interface.
    #[error("Server does not support administration")]
    AdminDisabled,

    /// The server does not relay contact messages.
    #[error("Server does not support contact messages")]
    EmailDisabled,

    /// A caller-supplied value was rejected.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// The HTTP layer could not be set up.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl SessionError {
    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        assert_eq!(SessionError::NotReady.to_string(), "Session is not ready");
        assert_eq!(
            SessionError::invalid_argument("meeting id must be positive").to_string(),
            "Invalid argument: meeting id must be positive"
        );
        let transport: SessionError = TransportError::busy().into();
        assert!(matches!(transport, SessionError::Transport(_)));
    }
}
