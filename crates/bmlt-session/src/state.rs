//! Session state: handshake progress, cached server data, admin login and
//! the in-flight slot.

use bmlt_core::{
    FormatRecord, FormatRegistry, LanguageRecord, PermissionTable, ServerInfo, ServiceBodyNode,
    ServiceBodyRecord, build_hierarchy,
};
use bmlt_protocol::CallType;

/// Correlation token carried by every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallToken {
    pub id: u64,
    pub call: CallType,
    /// Meeting the call concerns, for calls that have one.
    pub meeting_id: Option<i64>,
}

/// At most one request is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InFlight {
    #[default]
    Idle,
    Awaiting(CallToken),
}

/// Data cached by a completed handshake. Replaced wholesale on reconnect.
#[derive(Debug, Clone)]
pub struct SessionCache {
    pub info: ServerInfo,
    pub service_bodies: Vec<ServiceBodyRecord>,
    pub hierarchy: ServiceBodyNode,
    pub formats: FormatRegistry,
    pub languages: Vec<LanguageRecord>,
}

impl SessionCache {
    pub fn new(
        info: ServerInfo,
        service_bodies: Vec<ServiceBodyRecord>,
        formats: Vec<FormatRecord>,
        languages: Vec<LanguageRecord>,
        permissions: &PermissionTable,
    ) -> Self {
        let hierarchy = build_hierarchy(&service_bodies, permissions);
        Self {
            info,
            service_bodies,
            hierarchy,
            formats: FormatRegistry::new(formats),
            languages,
        }
    }
}

/// The connection handshake. Each stage carries what earlier stages fetched.
#[derive(Debug, Default)]
pub enum HandshakeState {
    #[default]
    Disconnected,
    TestingServer,
    FetchingServiceBodies {
        info: ServerInfo,
    },
    FetchingFormats {
        info: ServerInfo,
        service_bodies: Vec<ServiceBodyRecord>,
    },
    FetchingLanguages {
        info: ServerInfo,
        service_bodies: Vec<ServiceBodyRecord>,
        formats: Vec<FormatRecord>,
    },
    Ready(Box<SessionCache>),
}

impl HandshakeState {
    pub fn phase(&self) -> HandshakePhase {
        match self {
            Self::Disconnected => HandshakePhase::Disconnected,
            Self::TestingServer => HandshakePhase::TestingServer,
            Self::FetchingServiceBodies { .. } => HandshakePhase::FetchingServiceBodies,
            Self::FetchingFormats { .. } => HandshakePhase::FetchingFormats,
            Self::FetchingLanguages { .. } => HandshakePhase::FetchingLanguages,
            Self::Ready(_) => HandshakePhase::Ready,
        }
    }
}

/// Observable handshake stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakePhase {
    Disconnected,
    TestingServer,
    FetchingServiceBodies,
    FetchingFormats,
    FetchingLanguages,
    Ready,
}

/// Admin login state, layered on a ready session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AdminSession {
    #[default]
    LoggedOut,
    LoggingIn,
    AwaitingPermissions,
    LoggedIn(PermissionTable),
}

impl AdminSession {
    pub fn state(&self) -> AdminState {
        match self {
            Self::LoggedOut => AdminState::LoggedOut,
            Self::LoggingIn | Self::AwaitingPermissions => AdminState::LoggingIn,
            Self::LoggedIn(_) => AdminState::LoggedIn,
        }
    }

    pub fn permissions(&self) -> Option<&PermissionTable> {
        match self {
            Self::LoggedIn(table) => Some(table),
            _ => None,
        }
    }
}

/// Observable admin login state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminState {
    LoggedOut,
    LoggingIn,
    LoggedIn,
}
