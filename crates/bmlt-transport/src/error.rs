//! Transport error types.

use std::fmt;
use thiserror::Error;

/// The category of a transport error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorCode {
    /// A request is already in flight on this session.
    Busy,
    /// The URI could not be parsed.
    InvalidUri,
    /// The URI does not use `https`.
    InsecureScheme,
    /// The connection could not be established.
    Connect,
    /// The request timed out.
    Timeout,
    /// Certificate validation or TLS negotiation failed.
    Tls,
    /// The server answered with a non-success status.
    Status,
    /// The response body could not be read.
    Body,
    /// Client construction or other unexpected failure.
    Internal,
}

impl TransportErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Busy => "busy",
            Self::InvalidUri => "invalid_uri",
            Self::InsecureScheme => "insecure_scheme",
            Self::Connect => "connect",
            Self::Timeout => "timeout",
            Self::Tls => "tls",
            Self::Status => "status",
            Self::Body => "body",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for TransportErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A failure below the protocol layer.
#[derive(Debug, Error)]
pub struct TransportError {
    code: TransportErrorCode,
    message: String,
    /// HTTP status for [`TransportErrorCode::Status`] errors.
    status: Option<u16>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
    pub fn new(code: TransportErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
            source: None,
        }
    }

    pub fn busy() -> Self {
        Self::new(TransportErrorCode::Busy, "a request is already in flight")
    }

    pub fn invalid_uri(message: impl Into<String>) -> Self {
        Self::new(TransportErrorCode::InvalidUri, message)
    }

    pub fn insecure(uri: &str) -> Self {
        Self::new(
            TransportErrorCode::InsecureScheme,
            format!("refusing non-https uri {}", uri),
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(TransportErrorCode::Internal, message)
    }

    pub fn status(status: u16) -> Self {
        let mut error = Self::new(
            TransportErrorCode::Status,
            format!("server answered {}", status),
        );
        error.status = Some(status);
        error
    }

    pub fn body(message: impl Into<String>) -> Self {
        Self::new(TransportErrorCode::Body, message)
    }

    /// Classifies a reqwest failure.
    pub fn from_reqwest(error: reqwest::Error) -> Self {
        let code = if error.is_timeout() {
            TransportErrorCode::Timeout
        } else if error.is_connect() {
            if is_tls_failure(&error) {
                TransportErrorCode::Tls
            } else {
                TransportErrorCode::Connect
            }
        } else if error.is_body() || error.is_decode() {
            TransportErrorCode::Body
        } else if error.is_builder() {
            TransportErrorCode::InvalidUri
        } else {
            TransportErrorCode::Internal
        };
        let mut mapped = Self::new(code, format!("request failed: {}", error));
        mapped.status = error.status().map(|s| s.as_u16());
        mapped.with_source(error)
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> TransportErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn http_status(&self) -> Option<u16> {
        self.status
    }

    pub fn is_timeout(&self) -> bool {
        self.code == TransportErrorCode::Timeout
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Walks the source chain looking for a certificate complaint.
fn is_tls_failure(error: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(e) = current {
        let text = e.to_string().to_ascii_lowercase();
        if text.contains("certificate") || text.contains("tls") {
            return true;
        }
        current = e.source();
    }
    false
}

pub type TransportResult<T> = Result<T, TransportError>;
