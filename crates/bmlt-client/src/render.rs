//! Terminal and JSON rendering of session results.

use std::fmt::Write;

use serde_json::{Value, json};

use bmlt_core::{ChangeRecord, FormatRecord, ServiceBodyNode};
use bmlt_session::{Meeting, SessionCache};

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Summary printed after a successful handshake.
pub fn server_summary(root_uri: &str, cache: &SessionCache) -> String {
    let (major, feature, fix) = cache.info.version_parts();
    let mut out = String::new();
    let _ = writeln!(out, "Server: {} ({}.{}.{})", root_uri, major, feature, fix);
    out.push_str("Service bodies:\n");
    out.push_str(&service_body_tree(&cache.hierarchy, false));
    let _ = writeln!(out, "Formats: {}", cache.formats.len());
    let languages: Vec<String> = cache
        .languages
        .iter()
        .map(|l| {
            if l.is_default {
                format!("{} (default)", l.key)
            } else {
                l.key.clone()
            }
        })
        .collect();
    let _ = write!(out, "Languages: {}", languages.join(", "));
    out
}

/// One line per service body, indented by depth. The synthetic root is not
/// printed.
pub fn service_body_tree(root: &ServiceBodyNode, with_permissions: bool) -> String {
    let mut out = String::new();
    write_tree(&mut out, root, 0, with_permissions);
    out
}

fn write_tree(out: &mut String, node: &ServiceBodyNode, level: usize, with_permissions: bool) {
    let child_level = if node.is_root() {
        level
    } else {
        let _ = write!(out, "{:indent$}{} ({})", "", node.name(), node.id(), indent = level * 2 + 2);
        if with_permissions {
            let _ = write!(out, " [{}]", node.permission().as_str());
        }
        out.push('\n');
        level + 1
    };
    for child in node.children() {
        write_tree(out, child, child_level, with_permissions);
    }
}

pub fn meetings(meetings: &[Meeting]) -> String {
    if meetings.is_empty() {
        return "No meetings found".to_string();
    }
    meetings
        .iter()
        .map(|m| {
            let record = m.record();
            let day = record
                .weekday()
                .and_then(|d| WEEKDAYS.get(usize::from(d) - 1))
                .copied()
                .unwrap_or("???");
            let time = record
                .start_time()
                .map(|t| t.format("%H:%M").to_string())
                .unwrap_or_else(|| "--:--".to_string());
            let marker = if m.is_editable() { " *" } else { "" };
            format!(
                "#{} {} {} {} [{}]{}",
                record.id(),
                day,
                time,
                record.name(),
                record.formats_csv(),
                marker
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn formats(formats: &[FormatRecord]) -> String {
    formats
        .iter()
        .map(|f| format!("{} ({}): {}", f.key, f.lang, f.name))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn changes(changes: &[ChangeRecord]) -> String {
    if changes.is_empty() {
        return "No changes found".to_string();
    }
    changes
        .iter()
        .map(|c| format!("[{}] meeting {}: {}", c.change_id, c.meeting_id, c))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn server_json(root_uri: &str, cache: &SessionCache) -> Value {
    json!({
        "root_uri": root_uri,
        "server": cache.info,
        "service_bodies": tree_json(&cache.hierarchy),
        "formats": cache.formats.iter().collect::<Vec<_>>(),
        "languages": cache.languages,
    })
}

/// Nested `{id, name, permission, children}` objects; the root's children
/// form the top-level array.
pub fn tree_json(node: &ServiceBodyNode) -> Value {
    let children: Vec<Value> = node.children().iter().map(tree_json).collect();
    if node.is_root() {
        return Value::Array(children);
    }
    json!({
        "id": node.id(),
        "name": node.name(),
        "description": node.description(),
        "permission": node.permission(),
        "children": children,
    })
}

pub fn meetings_json(meetings: &[Meeting]) -> Value {
    Value::Array(
        meetings
            .iter()
            .map(|m| {
                json!({
                    "editable": m.is_editable(),
                    "fields": m.record().fields(),
                })
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use bmlt_core::{
        ChangeSnapshot, MeetingRecord, PermissionEntry, PermissionLevel, PermissionTable,
        ServiceBodyRecord, build_hierarchy,
    };

    use super::*;

    fn tree(permissions: &PermissionTable) -> ServiceBodyNode {
        build_hierarchy(
            &[
                ServiceBodyRecord::new(1, 0, "Region"),
                ServiceBodyRecord::new(2, 1, "North Area"),
                ServiceBodyRecord::new(3, 1, "South Area"),
            ],
            permissions,
        )
    }

    fn meeting(pairs: &[(&str, &str)]) -> MeetingRecord {
        MeetingRecord::from_fields(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn tree_is_indented_by_depth() {
        let text = service_body_tree(&tree(&PermissionTable::default()), false);
        assert_eq!(text, "  Region (1)\n    North Area (2)\n    South Area (3)\n");
    }

    #[test]
    fn tree_shows_permissions() {
        let table = PermissionTable::new(vec![PermissionEntry::new(
            2,
            "North Area",
            PermissionLevel::Editor,
        )]);
        let text = service_body_tree(&tree(&table), true);
        assert!(text.contains("North Area (2) [editor]"));
        assert!(text.contains("South Area (3) [none]"));

        let json = tree_json(&tree(&table));
        assert_eq!(json[0]["children"][0]["permission"], "editor");
        assert_eq!(json[0]["children"][1]["id"], 3);
    }

    #[test]
    fn meeting_lines() {
        let list = vec![
            Meeting::ReadOnly(meeting(&[
                ("id_bigint", "7"),
                ("weekday_tinyint", "3"),
                ("start_time", "19:30:00"),
                ("meeting_name", "Tuesday Group"),
                ("formats", "C,O"),
            ])),
            Meeting::ReadOnly(meeting(&[("id_bigint", "8"), ("meeting_name", "Odd")])),
        ];
        insta::assert_snapshot!(meetings(&list), @r"
        #7 Tue 19:30 Tuesday Group [C,O]
        #8 ??? --:-- Odd []
        ");
        assert_eq!(meetings(&[]), "No meetings found");
    }

    #[test]
    fn change_lines() {
        let change = ChangeRecord::new(
            12,
            ChangeSnapshot {
                before: None,
                after: Some(meeting(&[("id_bigint", "7")])),
            },
        )
        .with_editor("Jo")
        .with_meeting(7, 2, true);
        insta::assert_snapshot!(changes(&[change]), @"[12] meeting 7: unknown date: Jo created this meeting.");
    }
}
