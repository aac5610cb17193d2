//! Change history records.

use std::fmt;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::meeting::MeetingRecord;

/// The before/after pair embedded in a change entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSnapshot {
    pub before: Option<MeetingRecord>,
    pub after: Option<MeetingRecord>,
}

/// One field that differs between the two snapshots of a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub key: String,
    pub before: Option<String>,
    pub after: Option<String>,
}

/// A single entry of a meeting's change history.
///
/// A missing `before` means the change created the meeting, a missing
/// `after` means it deleted it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub change_id: i64,
    /// `None` when the server sent an unparseable date.
    pub timestamp: Option<DateTime<Utc>>,
    pub editor: String,
    pub details: String,
    pub meeting_id: i64,
    pub service_body_id: i64,
    /// Whether the meeting still exists on the server.
    pub meeting_exists: bool,
    pub before: Option<MeetingRecord>,
    pub after: Option<MeetingRecord>,
    /// Set when the change list was requested for a single meeting.
    pub target_meeting: Option<i64>,
}

impl ChangeRecord {
    pub fn new(change_id: i64, snapshot: ChangeSnapshot) -> Self {
        Self {
            change_id,
            timestamp: None,
            editor: String::new(),
            details: String::new(),
            meeting_id: 0,
            service_body_id: 0,
            meeting_exists: false,
            before: snapshot.before,
            after: snapshot.after,
            target_meeting: None,
        }
    }

    /// Sets the timestamp from epoch seconds.
    pub fn with_epoch(mut self, seconds: i64) -> Self {
        self.timestamp = DateTime::from_timestamp(seconds, 0);
        self
    }

    pub fn with_editor(mut self, editor: impl Into<String>) -> Self {
        self.editor = editor.into();
        self
    }

    /// Sets the details, decoding the HTML entities the server leaves in.
    pub fn with_details(mut self, details: &str) -> Self {
        self.details = unescape_details(details);
        self
    }

    pub fn with_meeting(mut self, meeting_id: i64, service_body_id: i64, exists: bool) -> Self {
        self.meeting_id = meeting_id;
        self.service_body_id = service_body_id;
        self.meeting_exists = exists;
        self
    }

    pub fn was_created(&self) -> bool {
        self.before.is_none() && self.after.is_some()
    }

    pub fn was_deleted(&self) -> bool {
        self.before.is_some() && self.after.is_none()
    }

    /// Fields that differ between `before` and `after`, limited to `keys`.
    ///
    /// Empty for creations and deletions.
    pub fn field_diff<S: AsRef<str>>(&self, keys: &[S]) -> Vec<FieldChange> {
        let (Some(before), Some(after)) = (&self.before, &self.after) else {
            return Vec::new();
        };
        let mut diff = Vec::new();
        for key in keys {
            let key = key.as_ref();
            let (old, new) = (before.get(key), after.get(key));
            if old != new {
                diff.push(FieldChange {
                    key: key.to_string(),
                    before: old.map(str::to_string),
                    after: new.map(str::to_string),
                });
            }
        }
        diff
    }

    /// Diff over every key either snapshot carries.
    pub fn full_diff(&self) -> Vec<FieldChange> {
        let mut keys: Vec<&str> = Vec::new();
        for record in [&self.before, &self.after].into_iter().flatten() {
            for key in record.fields().keys() {
                if !keys.contains(&key.as_str()) {
                    keys.push(key);
                }
            }
        }
        keys.sort_unstable();
        self.field_diff(&keys)
    }
}

fn unescape_details(details: &str) -> String {
    details.replace("&quot;", "\"").replace("&amp;", "&")
}

impl fmt::Display for ChangeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let when = self
            .timestamp
            .map(|t| {
                t.with_timezone(&Local)
                    .format("%-I:%M %p %B %-d, %Y")
                    .to_string()
            })
            .unwrap_or_else(|| "unknown date".to_string());
        if self.was_created() {
            return write!(f, "{}: {} created this meeting.", when, self.editor);
        }
        if self.was_deleted() {
            return write!(f, "{}: {} deleted this meeting.", when, self.editor);
        }
        write!(f, "{}: {} changed this meeting:", when, self.editor)?;
        for change in self.full_diff() {
            write!(
                f,
                "\n    {} changed from \"{}\" to \"{}\"",
                change.key,
                change.before.unwrap_or_default(),
                change.after.unwrap_or_default()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meeting(pairs: &[(&str, &str)]) -> MeetingRecord {
        MeetingRecord::from_fields(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn creation_and_deletion_predicates() {
        let m = meeting(&[("id_bigint", "1")]);
        let created = ChangeRecord::new(
            1,
            ChangeSnapshot {
                before: None,
                after: Some(m.clone()),
            },
        );
        assert!(created.was_created());
        assert!(!created.was_deleted());

        let deleted = ChangeRecord::new(
            2,
            ChangeSnapshot {
                before: Some(m),
                after: None,
            },
        );
        assert!(deleted.was_deleted());
        assert!(deleted.field_diff(&["id_bigint"]).is_empty());
    }

    #[test]
    fn field_diff_limited_to_known_keys() {
        let change = ChangeRecord::new(
            3,
            ChangeSnapshot {
                before: Some(meeting(&[("meeting_name", "Old"), ("published", "1"), ("x", "1")])),
                after: Some(meeting(&[("meeting_name", "New"), ("published", "0"), ("x", "2")])),
            },
        );
        let diff = change.field_diff(&["meeting_name", "published"]);
        assert_eq!(diff.len(), 2);
        assert_eq!(diff[0].key, "meeting_name");
        assert_eq!(diff[0].before.as_deref(), Some("Old"));
        assert_eq!(diff[1].after.as_deref(), Some("0"));
        assert_eq!(change.full_diff().len(), 3);
    }

    #[test]
    fn details_are_unescaped() {
        let change = ChangeRecord::new(4, ChangeSnapshot::default())
            .with_details("&quot;Name&quot; &amp; place")
            .with_epoch(1_500_000_000);
        assert_eq!(change.details, "\"Name\" & place");
        assert_eq!(change.timestamp.map(|t| t.timestamp()), Some(1_500_000_000));
    }

    #[test]
    fn description_lists_changed_fields() {
        let change = ChangeRecord::new(
            5,
            ChangeSnapshot {
                before: Some(meeting(&[("meeting_name", "Old")])),
                after: Some(meeting(&[("meeting_name", "New")])),
            },
        )
        .with_editor("Jo");
        let text = change.to_string();
        assert!(text.starts_with("unknown date: Jo changed this meeting:"));
        assert!(text.ends_with("meeting_name changed from \"Old\" to \"New\""));
    }
}
