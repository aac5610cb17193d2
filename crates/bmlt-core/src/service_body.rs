//! Service bodies and the hierarchy built from them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::permission::{PermissionLevel, PermissionTable};

/// A service body as listed by the server, before tree building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceBodyRecord {
    pub id: i64,
    /// 0 for a top-level body.
    pub parent_id: i64,
    pub name: String,
    pub description: String,
    /// Body type code (`AS`, `RS`, `MA`...), when present.
    pub kind: Option<String>,
    pub uri: Option<String>,
}

impl ServiceBodyRecord {
    /// Keys whose presence identifies a service body object.
    pub const FINGERPRINT: &'static [&'static str] = &["parent_id", "description", "name"];

    pub fn new(id: i64, parent_id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            parent_id,
            name: name.into(),
            description: String::new(),
            kind: None,
            uri: None,
        }
    }

    /// Builds a record from the server's string fields.
    pub fn from_fields(fields: &BTreeMap<String, String>) -> Option<Self> {
        let int = |k: &str| fields.get(k).and_then(|v| v.trim().parse::<i64>().ok());
        let text = |k: &str| fields.get(k).cloned().unwrap_or_default();
        let optional = |k: &str| fields.get(k).filter(|v| !v.is_empty()).cloned();
        Some(Self {
            id: int("id")?,
            parent_id: int("parent_id").unwrap_or(0),
            name: text("name"),
            description: text("description"),
            kind: optional("type"),
            uri: optional("url"),
        })
    }
}

/// A node in the service body tree.
///
/// The root is synthetic: it carries no record and has id 0.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServiceBodyNode {
    record: Option<ServiceBodyRecord>,
    permission: PermissionLevel,
    depth: usize,
    children: Vec<ServiceBodyNode>,
}

/// Builds the tree rooted at a synthetic node.
///
/// Construction is depth-first: each match on the current id is expanded
/// fully before the scan continues. Bodies whose parent is not in the list
/// are unreachable and left out.
///
/// There is no cycle detection. A `parent_id` cycle reachable from the root
/// recurses without bound.
pub fn build_hierarchy(records: &[ServiceBodyRecord], permissions: &PermissionTable) -> ServiceBodyNode {
    ServiceBodyNode {
        record: None,
        permission: PermissionLevel::None,
        depth: 0,
        children: grow(records, 0, 1, permissions),
    }
}

fn grow(
    records: &[ServiceBodyRecord],
    parent_id: i64,
    depth: usize,
    permissions: &PermissionTable,
) -> Vec<ServiceBodyNode> {
    records
        .iter()
        .filter(|r| r.parent_id == parent_id)
        .map(|r| ServiceBodyNode {
            record: Some(r.clone()),
            permission: permissions.level_for(r.id),
            depth,
            children: grow(records, r.id, depth + 1, permissions),
        })
        .collect()
}

impl ServiceBodyNode {
    /// 0 for the root.
    pub fn id(&self) -> i64 {
        self.record.as_ref().map_or(0, |r| r.id)
    }

    pub fn is_root(&self) -> bool {
        self.record.is_none()
    }

    pub fn record(&self) -> Option<&ServiceBodyRecord> {
        self.record.as_ref()
    }

    pub fn name(&self) -> &str {
        self.record.as_ref().map_or("", |r| r.name.as_str())
    }

    /// The description, or the name when the description is empty.
    pub fn description(&self) -> &str {
        match &self.record {
            Some(r) if !r.description.is_empty() => &r.description,
            Some(r) => &r.name,
            None => "",
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn children(&self) -> &[ServiceBodyNode] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// All descendants, at any depth.
    pub fn complete_child_count(&self) -> usize {
        self.children
            .iter()
            .map(|c| 1 + c.complete_child_count())
            .sum()
    }

    /// True if this node or a descendant has the given id.
    pub fn contains(&self, id: i64) -> bool {
        self.find(id).is_some()
    }

    pub fn find(&self, id: i64) -> Option<&ServiceBodyNode> {
        if !self.is_root() && self.id() == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    /// Descendants in depth-first order, excluding this node.
    pub fn descendants(&self) -> Vec<&ServiceBodyNode> {
        let mut out = Vec::with_capacity(self.complete_child_count());
        for child in &self.children {
            out.push(child);
            out.extend(child.descendants());
        }
        out
    }

    pub fn permission(&self) -> PermissionLevel {
        self.permission
    }

    pub fn can_observe(&self) -> bool {
        self.permission.can_observe()
    }

    pub fn can_edit(&self) -> bool {
        self.permission.can_edit()
    }

    pub fn can_administer(&self) -> bool {
        self.permission == PermissionLevel::Administrator
    }

    /// Re-reads every cached permission level from a new table.
    pub fn refresh_permissions(&mut self, permissions: &PermissionTable) {
        if !self.is_root() {
            self.permission = permissions.level_for(self.id());
        }
        for child in &mut self.children {
            child.refresh_permissions(permissions);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::PermissionEntry;

    #[test]
    fn flat_list_gives_direct_children_only() {
        let records: Vec<_> = (1..=5)
            .map(|i| ServiceBodyRecord::new(i, 0, format!("Body {i}")))
            .collect();
        let root = build_hierarchy(&records, &PermissionTable::default());

        assert!(root.is_root());
        assert_eq!(root.children().len(), 5);
        assert!(root.children().iter().all(|c| !c.has_children()));
        assert_eq!(root.complete_child_count(), 5);
    }

    #[test]
    fn nested_tree_is_depth_first() {
        let records = vec![
            ServiceBodyRecord::new(1, 0, "Region"),
            ServiceBodyRecord::new(2, 1, "Area A"),
            ServiceBodyRecord::new(3, 1, "Area B"),
            ServiceBodyRecord::new(4, 2, "District"),
            ServiceBodyRecord::new(5, 0, "Other Region"),
            ServiceBodyRecord::new(6, 42, "Orphan"),
        ];
        let root = build_hierarchy(&records, &PermissionTable::default());

        let order: Vec<i64> = root.descendants().iter().map(|n| n.id()).collect();
        assert_eq!(order, vec![1, 2, 4, 3, 5]);
        assert_eq!(root.find(4).map(|n| n.depth()), Some(3));
        assert!(root.find(1).is_some_and(|n| n.contains(4)));
        assert!(!root.contains(6));
    }

    #[test]
    fn permissions_are_cached_and_refreshed() {
        let records = vec![
            ServiceBodyRecord::new(1, 0, "Region"),
            ServiceBodyRecord::new(2, 1, "Area"),
        ];
        let mut root = build_hierarchy(
            &records,
            &PermissionTable::new(vec![PermissionEntry::new(2, "Area", PermissionLevel::Editor)]),
        );
        assert!(root.find(2).is_some_and(|n| n.can_edit()));
        assert!(root.find(1).is_some_and(|n| !n.can_observe()));

        root.refresh_permissions(&PermissionTable::default());
        assert!(root.find(2).is_some_and(|n| !n.can_edit()));
    }

    #[test]
    fn description_falls_back_to_name() {
        let mut record = ServiceBodyRecord::new(1, 0, "Region");
        let root = build_hierarchy(std::slice::from_ref(&record), &PermissionTable::default());
        assert_eq!(root.children()[0].description(), "Region");

        record.description = "The region".into();
        let root = build_hierarchy(&[record], &PermissionTable::default());
        assert_eq!(root.children()[0].description(), "The region");
    }
}
