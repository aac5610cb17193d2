//! Client error types.

use thiserror::Error;

use bmlt_protocol::{HandshakeFailure, ServiceError};
use bmlt_session::SessionError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that end a CLI invocation.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Session(#[from] SessionError),

    /// The handshake ended without a usable session.
    #[error("server rejected: {0}")]
    Handshake(HandshakeFailure),

    /// The server answered a call with an error.
    #[error("server error: {0}")]
    Service(#[from] ServiceError),

    #[error("login failed for {0}")]
    LoginFailed(String),

    /// The event stream ended before the expected result arrived.
    #[error("no {0} received from server")]
    NoResult(&'static str),

    #[error("output error: {0}")]
    Output(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        assert_eq!(
            ClientError::Handshake(HandshakeFailure::WrongVersion).to_string(),
            format!("server rejected: {}", HandshakeFailure::WrongVersion)
        );
        assert_eq!(
            ClientError::LoginFailed("jdoe".into()).to_string(),
            "login failed for jdoe"
        );
        let session: ClientError = SessionError::NotReady.into();
        assert_eq!(session.to_string(), SessionError::NotReady.to_string());
    }
}
