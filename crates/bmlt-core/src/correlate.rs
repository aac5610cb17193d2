//! Change list filtering and ordering.

use std::cmp::Reverse;

use tracing::trace;

use crate::change::ChangeRecord;
use crate::permission::PermissionTable;

/// Filters and orders a raw change list.
///
/// With `deleted_only`, an entry is kept only if it has no `after` snapshot
/// and the meeting no longer exists; a later entry for the same meeting id
/// replaces an earlier one. When a permission table is supplied (an admin is
/// logged in) deleted entries must also have an editable, named `before`
/// meeting with a positive id and a weekday in 1..=7.
///
/// The result is ordered most recent first; entries without a timestamp
/// sort to the front.
pub fn correlate_changes(
    changes: Vec<ChangeRecord>,
    deleted_only: bool,
    permissions: Option<&PermissionTable>,
) -> Vec<ChangeRecord> {
    let mut kept: Vec<ChangeRecord> = Vec::with_capacity(changes.len());

    for change in changes {
        if deleted_only {
            if change.after.is_some() || change.meeting_exists {
                trace!(change_id = change.change_id, "skipping non-deletion");
                continue;
            }
            if let Some(pos) = kept.iter().position(|c| c.meeting_id == change.meeting_id) {
                kept.remove(pos);
            }
        }

        let keep = match (deleted_only, permissions) {
            (true, Some(table)) => restorable(&change, table),
            _ => true,
        };
        if keep {
            kept.push(change);
        }
    }

    kept.sort_by_key(|c| c.timestamp.map(Reverse));
    kept
}

fn restorable(change: &ChangeRecord, permissions: &PermissionTable) -> bool {
    let Some(before) = &change.before else {
        return false;
    };
    permissions.level_for(before.service_body_id()).can_edit()
        && !before.name().is_empty()
        && before.id() > 0
        && before.weekday().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::ChangeSnapshot;
    use crate::meeting::MeetingRecord;
    use crate::permission::{PermissionEntry, PermissionLevel};

    fn meeting(id: i64, sb: i64, name: &str, weekday: &str) -> MeetingRecord {
        MeetingRecord::from_fields(
            [
                ("id_bigint", id.to_string()),
                ("service_body_bigint", sb.to_string()),
                ("meeting_name", name.to_string()),
                ("weekday_tinyint", weekday.to_string()),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
        )
    }

    fn change(
        id: i64,
        epoch: i64,
        meeting_id: i64,
        before: Option<MeetingRecord>,
        after: Option<MeetingRecord>,
    ) -> ChangeRecord {
        ChangeRecord::new(id, ChangeSnapshot { before, after })
            .with_epoch(epoch)
            .with_meeting(meeting_id, 3, false)
    }

    #[test]
    fn deleted_only_drops_entries_with_after_snapshot() {
        let m = meeting(42, 3, "Basic Text", "2");
        let changes = vec![
            change(1, 100, 42, Some(m.clone()), Some(m.clone())),
            change(2, 200, 42, Some(m), None),
        ];
        let result = correlate_changes(changes, true, None);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].change_id, 2);
        assert!(result[0].after.is_none());
    }

    #[test]
    fn deleted_only_keeps_last_entry_per_meeting() {
        let m = meeting(42, 3, "Basic Text", "2");
        let changes = vec![
            change(1, 100, 42, Some(m.clone()), None),
            change(2, 50, 42, Some(m.clone()), None),
            change(3, 75, 7, Some(m), None),
        ];
        let ids: Vec<i64> = correlate_changes(changes, true, None)
            .iter()
            .map(|c| c.change_id)
            .collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[test]
    fn deleted_only_skips_meetings_that_still_exist() {
        let m = meeting(42, 3, "Basic Text", "2");
        let mut c = change(1, 100, 42, Some(m), None);
        c.meeting_exists = true;
        assert!(correlate_changes(vec![c], true, None).is_empty());
    }

    #[test]
    fn admin_filter_requires_restorable_before() {
        let table = PermissionTable::new(vec![PermissionEntry::new(
            3,
            "Area",
            PermissionLevel::Editor,
        )]);
        let changes = vec![
            change(1, 10, 1, Some(meeting(1, 3, "Good", "3")), None),
            change(2, 20, 2, Some(meeting(2, 3, "", "3")), None),
            change(3, 30, 3, Some(meeting(3, 3, "Bad day", "0")), None),
            change(4, 40, 4, Some(meeting(4, 9, "No rights", "3")), None),
            change(5, 50, 5, None, None),
        ];
        let result = correlate_changes(changes, true, Some(&table));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].change_id, 1);
    }

    #[test]
    fn all_changes_pass_and_sort_descending() {
        let m = meeting(1, 3, "A", "1");
        let mut undated = change(9, 0, 1, Some(m.clone()), Some(m.clone()));
        undated.timestamp = None;
        let changes = vec![
            change(1, 100, 1, None, Some(m.clone())),
            change(2, 300, 1, Some(m.clone()), Some(m.clone())),
            undated,
            change(3, 200, 1, Some(m), None),
        ];
        let ids: Vec<i64> = correlate_changes(changes, false, None)
            .iter()
            .map(|c| c.change_id)
            .collect();
        assert_eq!(ids, vec![9, 2, 3, 1]);
    }
}
