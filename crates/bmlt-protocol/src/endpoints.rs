//! Root-relative endpoint paths and the call types that use them.

use std::fmt;

const JSON_INTERFACE: &str = "/client_interface/json/";
const ADMIN_INTERFACE: &str = "/local_server/server_admin/json.php";

/// Every kind of request the session issues.
///
/// The call type travels with each request as its correlation tag and
/// selects the response handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallType {
    ServerTest,
    ServiceBodies,
    Formats,
    Languages,
    MeetingSearch,
    Changes,
    /// Change history for one meeting.
    MeetingChanges,
    DeletedMeetings,
    AdminLogin,
    AdminLogout,
    AdminPermissions,
    AdminSaveMeeting,
    AdminCreateMeeting,
    AdminDeleteMeeting,
    AdminRollbackMeeting,
    AdminRestoreMeeting,
    /// Read-back of a meeting just created.
    NewMeetingInfo,
    /// Read-back of a meeting just restored.
    RestoredMeetingInfo,
    /// Read-back of a meeting just rolled back.
    RolledBackMeetingInfo,
    SendMessage,
}

impl CallType {
    /// Path (and fixed query) appended to the root server URI.
    pub fn path(&self) -> &'static str {
        match self {
            Self::ServerTest => "/client_interface/json/?switcher=GetServerInfo",
            Self::ServiceBodies => "/client_interface/json/?switcher=GetServiceBodies",
            Self::Formats => "/client_interface/json/?switcher=GetFormats",
            Self::Languages => "/client_interface/json/GetLangs.php",
            Self::MeetingSearch
            | Self::NewMeetingInfo
            | Self::RestoredMeetingInfo
            | Self::RolledBackMeetingInfo => "/client_interface/json/?switcher=GetSearchResults",
            Self::Changes | Self::MeetingChanges | Self::DeletedMeetings => {
                "/client_interface/json/?switcher=GetChanges"
            }
            Self::AdminLogin => "/local_server/server_admin/json.php?admin_action=login",
            Self::AdminLogout => "/local_server/server_admin/json.php?admin_action=logout",
            Self::AdminPermissions => {
                "/local_server/server_admin/json.php?admin_action=get_permissions"
            }
            Self::AdminSaveMeeting => {
                "/local_server/server_admin/json.php?admin_action=modify_meeting"
            }
            Self::AdminCreateMeeting => "/local_server/server_admin/json.php?admin_action=add_meeting",
            Self::AdminDeleteMeeting => {
                "/local_server/server_admin/json.php?admin_action=delete_meeting"
            }
            Self::AdminRollbackMeeting => {
                "/local_server/server_admin/json.php?admin_action=rollback_meeting_to_before_change"
            }
            Self::AdminRestoreMeeting => {
                "/local_server/server_admin/json.php?admin_action=restore_deleted_meeting"
            }
            Self::SendMessage => "/client_interface/contact.php",
        }
    }

    /// True for the four calls of the connection handshake.
    pub fn is_handshake(&self) -> bool {
        matches!(
            self,
            Self::ServerTest | Self::ServiceBodies | Self::Formats | Self::Languages
        )
    }

    /// True for calls against the admin interface.
    pub fn is_admin(&self) -> bool {
        self.path().starts_with(ADMIN_INTERFACE)
    }

    /// True for calls against the public JSON interface.
    pub fn is_public_json(&self) -> bool {
        self.path().starts_with(JSON_INTERFACE)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ServerTest => "server_test",
            Self::ServiceBodies => "service_bodies",
            Self::Formats => "formats",
            Self::Languages => "languages",
            Self::MeetingSearch => "meeting_search",
            Self::Changes => "changes",
            Self::MeetingChanges => "meeting_changes",
            Self::DeletedMeetings => "deleted_meetings",
            Self::AdminLogin => "admin_login",
            Self::AdminLogout => "admin_logout",
            Self::AdminPermissions => "admin_permissions",
            Self::AdminSaveMeeting => "admin_save_meeting",
            Self::AdminCreateMeeting => "admin_create_meeting",
            Self::AdminDeleteMeeting => "admin_delete_meeting",
            Self::AdminRollbackMeeting => "admin_rollback_meeting",
            Self::AdminRestoreMeeting => "admin_restore_meeting",
            Self::NewMeetingInfo => "new_meeting_info",
            Self::RestoredMeetingInfo => "restored_meeting_info",
            Self::RolledBackMeetingInfo => "rolled_back_meeting_info",
            Self::SendMessage => "send_message",
        }
    }
}

impl fmt::Display for CallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_and_admin_classification() {
        assert!(CallType::ServerTest.is_handshake());
        assert!(CallType::Languages.is_handshake());
        assert!(!CallType::MeetingSearch.is_handshake());
        assert!(CallType::AdminRestoreMeeting.is_admin());
        assert!(!CallType::DeletedMeetings.is_admin());
        assert!(CallType::Languages.is_public_json());
        assert!(!CallType::SendMessage.is_public_json());
    }

    #[test]
    fn read_backs_share_the_search_path() {
        assert_eq!(CallType::NewMeetingInfo.path(), CallType::MeetingSearch.path());
        assert_eq!(CallType::DeletedMeetings.path(), CallType::Changes.path());
        assert!(CallType::Languages.path().ends_with(".php"));
    }
}
