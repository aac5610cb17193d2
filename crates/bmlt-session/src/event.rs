//! Notifications delivered to the presentation layer.

use bmlt_core::{ChangeRecord, FormatRecord};
use bmlt_protocol::{HandshakeFailure, MeetingChange, ServiceError};

use crate::meeting::Meeting;

/// Everything the session reports back.
#[derive(Debug)]
pub enum SessionEvent {
    /// The handshake finished (`valid`) or the session was torn down.
    ServerValidity {
        valid: bool,
        failure: Option<HandshakeFailure>,
    },
    /// A failure surfaced once, with its (domain, code) classification.
    Error(ServiceError),
    /// Sent after every login or logout attempt, changed or not.
    LoginChanged { logged_in: bool },
    SearchResults(Vec<Meeting>),
    FormatResults(Vec<FormatRecord>),
    ChangeResults {
        changes: Vec<ChangeRecord>,
        /// Set when the query targeted one meeting.
        meeting_id: Option<i64>,
        deleted_only: bool,
    },
    NewMeeting(Meeting),
    RolledBack(Meeting),
    Restored(Meeting),
    /// A save finished; `None` when the server reported no field changes.
    ChangeComplete(Option<MeetingChange>),
    Deleted { meeting_id: i64, deleted: bool },
    MessageSent(bool),
}

impl SessionEvent {
    /// Short name of the event, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ServerValidity { .. } => "server_validity",
            Self::Error(_) => "error",
            Self::LoginChanged { .. } => "login_changed",
            Self::SearchResults(_) => "search_results",
            Self::FormatResults(_) => "format_results",
            Self::ChangeResults { .. } => "change_results",
            Self::NewMeeting(_) => "new_meeting",
            Self::RolledBack(_) => "rolled_back",
            Self::Restored(_) => "restored",
            Self::ChangeComplete(_) => "change_complete",
            Self::Deleted { .. } => "deleted",
            Self::MessageSent(_) => "message_sent",
        }
    }
}
