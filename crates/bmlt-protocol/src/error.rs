//! Error taxonomy shared by every layer that talks to a root server.
//!
//! Errors surfaced to callers are a coarse (domain, code) pair. The numeric
//! codes are stable and match what existing root server clients report.

use std::fmt;
use thiserror::Error;

/// Broad error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorDomain {
    /// Transport failures and unusable responses.
    Communication,
    /// Login and authorization failures.
    Permission,
    /// Failures sending a message to a meeting contact.
    MailSending,
}

impl ErrorDomain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Communication => "communication",
            Self::Permission => "permission",
            Self::MailSending => "mail_sending",
        }
    }
}

impl fmt::Display for ErrorDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Specific error code within a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The server answered `ERROR`, or the request failed outright.
    General,
    /// Empty or undecodable response body.
    NoDataReceived,
    /// A response that does not have the shape the call expects.
    BadDataReceived,
    /// Login rejected (`NOT AUTHORIZED`).
    IncorrectCredentials,
    /// The contact form failed for an unknown reason.
    SendingUnknown,
    /// The contact form rejected the sender address.
    MessageInvalidFrom,
    /// The contact form flagged the message as spam.
    MessageAppearsToBeSpam,
}

impl ErrorCode {
    /// The domain this code belongs to.
    pub fn domain(&self) -> ErrorDomain {
        match self {
            Self::General | Self::NoDataReceived | Self::BadDataReceived => {
                ErrorDomain::Communication
            }
            Self::IncorrectCredentials => ErrorDomain::Permission,
            Self::SendingUnknown | Self::MessageInvalidFrom | Self::MessageAppearsToBeSpam => {
                ErrorDomain::MailSending
            }
        }
    }

    /// Stable numeric code.
    pub fn number(&self) -> u32 {
        match self {
            Self::General => 101_000,
            Self::NoDataReceived => 101_010,
            Self::BadDataReceived => 101_020,
            Self::IncorrectCredentials => 201_000,
            Self::SendingUnknown => 301_000,
            Self::MessageInvalidFrom => 301_020,
            Self::MessageAppearsToBeSpam => 301_030,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general_error",
            Self::NoDataReceived => "no_data_received",
            Self::BadDataReceived => "bad_data_received",
            Self::IncorrectCredentials => "incorrect_credentials",
            Self::SendingUnknown => "sending_unknown_error",
            Self::MessageInvalidFrom => "message_invalid_from",
            Self::MessageAppearsToBeSpam => "message_appears_to_be_spam",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error reported by the session layer.
#[derive(Debug, Error)]
pub struct ServiceError {
    code: ErrorCode,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ServiceError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Generic communication failure.
    pub fn general(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::General, message)
    }

    /// Empty or undecodable response.
    pub fn no_data(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NoDataReceived, message)
    }

    /// Response of the wrong shape.
    pub fn bad_data(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadDataReceived, message)
    }

    /// Login rejected.
    pub fn incorrect_credentials(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::IncorrectCredentials, message)
    }

    /// Maps the contact form's status string to a mail error.
    pub fn mail(status: &str) -> Self {
        let code = match status.trim() {
            "-2" => ErrorCode::MessageInvalidFrom,
            "-3" => ErrorCode::MessageAppearsToBeSpam,
            _ => ErrorCode::SendingUnknown,
        };
        Self::new(code, format!("contact form returned {:?}", status))
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn domain(&self) -> ErrorDomain {
        self.code.domain()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}): {}",
            self.domain(),
            self.code,
            self.code.number(),
            self.message
        )
    }
}

/// Why a connection handshake ended without a usable session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum HandshakeFailure {
    /// The root server URI did not answer like a root server.
    #[error("not a root server URI")]
    BadUri,
    /// The server is older than the supported minimum.
    #[error("server version is too old")]
    WrongVersion,
    /// The server lacks standard meeting fields.
    #[error("server is missing standard meeting fields")]
    MissingFields,
    /// The server has no service bodies.
    #[error("server has no service bodies")]
    NoServiceBodies,
    /// The server has no formats.
    #[error("server has no formats")]
    NoFormats,
    /// A handshake call failed or returned unusable data.
    #[error("communication error during handshake")]
    CommError,
    /// The server refused the request.
    #[error("authorization error during handshake")]
    AuthError,
}

impl HandshakeFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadUri => "bad_uri",
            Self::WrongVersion => "wrong_version",
            Self::MissingFields => "missing_fields",
            Self::NoServiceBodies => "no_service_bodies",
            Self::NoFormats => "no_formats",
            Self::CommError => "comm_error",
            Self::AuthError => "auth_error",
        }
    }
}

/// Result alias for session-layer operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_map_to_domains_and_numbers() {
        assert_eq!(ErrorCode::NoDataReceived.domain(), ErrorDomain::Communication);
        assert_eq!(ErrorCode::IncorrectCredentials.domain(), ErrorDomain::Permission);
        assert_eq!(ErrorCode::MessageAppearsToBeSpam.domain(), ErrorDomain::MailSending);
        assert_eq!(ErrorCode::BadDataReceived.number(), 101_020);
        assert_eq!(ErrorCode::IncorrectCredentials.number(), 201_000);
    }

    #[test]
    fn mail_status_mapping() {
        assert_eq!(ServiceError::mail("-2").code(), ErrorCode::MessageInvalidFrom);
        assert_eq!(ServiceError::mail("-3").code(), ErrorCode::MessageAppearsToBeSpam);
        assert_eq!(ServiceError::mail("0").code(), ErrorCode::SendingUnknown);
    }

    #[test]
    fn display_includes_domain_and_code() {
        let err = ServiceError::incorrect_credentials("login rejected");
        insta::assert_snapshot!(
            err.to_string(),
            @"[permission] incorrect_credentials (201000): login rejected"
        );
    }

    #[test]
    fn source_is_kept() {
        use std::error::Error;
        let err = ServiceError::general("request failed").with_source(std::io::Error::other("reset"));
        assert!(err.source().is_some());
    }
}
