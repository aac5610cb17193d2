//! Meetings as handed to callers, editable or not.

use bmlt_core::{EditableMeeting, MeetingRecord, PermissionTable};

/// A meeting from a search or read-back.
///
/// Meetings in service bodies the admin can edit come wrapped for editing;
/// everything else is read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Meeting {
    ReadOnly(MeetingRecord),
    Editable(EditableMeeting),
}

impl Meeting {
    /// Wraps a record according to the permission table, if any.
    pub fn classify(record: MeetingRecord, permissions: Option<&PermissionTable>) -> Self {
        match permissions {
            Some(table) if table.level_for(record.service_body_id()).can_edit() => {
                Self::Editable(EditableMeeting::new(record))
            }
            _ => Self::ReadOnly(record),
        }
    }

    pub fn record(&self) -> &MeetingRecord {
        match self {
            Self::ReadOnly(record) => record,
            Self::Editable(editable) => editable.record(),
        }
    }

    pub fn id(&self) -> i64 {
        self.record().id()
    }

    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Editable(_))
    }

    pub fn into_editable(self) -> Option<EditableMeeting> {
        match self {
            Self::Editable(editable) => Some(editable),
            Self::ReadOnly(_) => None,
        }
    }

    pub fn into_record(self) -> MeetingRecord {
        match self {
            Self::ReadOnly(record) => record,
            Self::Editable(editable) => editable.into_record(),
        }
    }
}
