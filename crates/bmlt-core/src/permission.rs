//! Admin permissions per service body.

use serde::{Deserialize, Serialize};

/// Access level the logged-in admin holds on a service body.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PermissionLevel {
    #[default]
    None,
    Observer,
    Editor,
    Administrator,
}

impl PermissionLevel {
    /// Maps the server's numeric level (0..=3); anything else is `None`.
    pub fn from_wire(value: i64) -> Self {
        match value {
            1 => Self::Observer,
            2 => Self::Editor,
            3 => Self::Administrator,
            _ => Self::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Observer => "observer",
            Self::Editor => "editor",
            Self::Administrator => "administrator",
        }
    }

    pub fn can_observe(&self) -> bool {
        *self >= Self::Observer
    }

    pub fn can_edit(&self) -> bool {
        *self >= Self::Editor
    }
}

/// One row of the permission table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionEntry {
    pub service_body_id: i64,
    pub name: String,
    pub level: PermissionLevel,
}

impl PermissionEntry {
    pub fn new(service_body_id: i64, name: impl Into<String>, level: PermissionLevel) -> Self {
        Self {
            service_body_id,
            name: name.into(),
            level,
        }
    }
}

/// The permission set of the current admin login.
///
/// Replaced wholesale on every permission fetch. Service body counts are
/// small, so lookups are linear scans.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionTable {
    entries: Vec<PermissionEntry>,
}

impl PermissionTable {
    pub fn new(entries: Vec<PermissionEntry>) -> Self {
        Self { entries }
    }

    /// Level for a service body; `None` if it is not in the table.
    pub fn level_for(&self, service_body_id: i64) -> PermissionLevel {
        self.entries
            .iter()
            .find(|e| e.service_body_id == service_body_id)
            .map(|e| e.level)
            .unwrap_or_default()
    }

    pub fn entries(&self) -> &[PermissionEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_levels() {
        assert_eq!(PermissionLevel::from_wire(0), PermissionLevel::None);
        assert_eq!(PermissionLevel::from_wire(2), PermissionLevel::Editor);
        assert_eq!(PermissionLevel::from_wire(3), PermissionLevel::Administrator);
        assert_eq!(PermissionLevel::from_wire(9), PermissionLevel::None);
        assert!(PermissionLevel::Administrator.can_edit());
        assert!(!PermissionLevel::Observer.can_edit());
    }

    #[test]
    fn lookup_falls_back_to_none() {
        let table = PermissionTable::new(vec![
            PermissionEntry::new(3, "Area", PermissionLevel::Editor),
            PermissionEntry::new(7, "Region", PermissionLevel::Observer),
        ]);
        assert_eq!(table.level_for(3), PermissionLevel::Editor);
        assert_eq!(table.level_for(7), PermissionLevel::Observer);
        assert_eq!(table.level_for(99), PermissionLevel::None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn serializes_level_names() {
        let entry = PermissionEntry::new(4, "Area", PermissionLevel::Administrator);
        insta::assert_json_snapshot!(entry, @r#"
        {
          "service_body_id": 4,
          "name": "Area",
          "level": "administrator"
        }
        "#);
        let level: PermissionLevel = serde_json::from_str("\"observer\"").unwrap();
        assert_eq!(level, PermissionLevel::Observer);
    }
}
