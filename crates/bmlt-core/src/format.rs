//! Meeting formats and the format registry.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// A meeting format (e.g. "O" for open, "C" for closed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatRecord {
    pub id: i64,
    pub key: String,
    pub name: String,
    pub description: String,
    pub lang: String,
    /// NAWS world format code, when the server provides one.
    pub world_id: Option<String>,
}

impl FormatRecord {
    /// Keys whose presence identifies a format object.
    pub const FINGERPRINT: &'static [&'static str] =
        &["key_string", "name_string", "description_string", "lang", "id"];

    /// Builds a format from the server's string fields.
    ///
    /// Returns `None` when the id is not numeric.
    pub fn from_fields(fields: &BTreeMap<String, String>) -> Option<Self> {
        let get = |k: &str| fields.get(k).cloned().unwrap_or_default();
        let id = fields.get("id")?.trim().parse().ok()?;
        Some(Self {
            id,
            key: get("key_string"),
            name: get("name_string"),
            description: get("description_string"),
            lang: get("lang"),
            world_id: fields
                .get("world_id")
                .filter(|w| !w.is_empty())
                .cloned(),
        })
    }
}

/// Flat registry of the formats fetched during the handshake, addressable
/// by id and by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatRegistry {
    by_id: BTreeMap<i64, FormatRecord>,
    by_key: HashMap<String, i64>,
}

impl FormatRegistry {
    pub fn new(formats: impl IntoIterator<Item = FormatRecord>) -> Self {
        let mut registry = Self::default();
        for format in formats {
            registry.insert(format);
        }
        registry
    }

    /// Adds or replaces a format.
    pub fn insert(&mut self, format: FormatRecord) {
        if let Some(previous) = self.by_id.get(&format.id) {
            self.by_key.remove(&previous.key);
        }
        self.by_key.insert(format.key.clone(), format.id);
        self.by_id.insert(format.id, format);
    }

    pub fn by_id(&self, id: i64) -> Option<&FormatRecord> {
        self.by_id.get(&id)
    }

    pub fn by_key(&self, key: &str) -> Option<&FormatRecord> {
        self.by_key.get(key).and_then(|id| self.by_id.get(id))
    }

    /// Formats ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = &FormatRecord> {
        self.by_id.values()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn from_fields_requires_numeric_id() {
        let f = FormatRecord::from_fields(&fields(&[
            ("id", "17"),
            ("key_string", "O"),
            ("name_string", "Open"),
            ("description_string", "Anyone may attend"),
            ("lang", "en"),
            ("world_id", "OPEN"),
        ]))
        .unwrap();
        assert_eq!(f.id, 17);
        assert_eq!(f.key, "O");
        assert_eq!(f.world_id.as_deref(), Some("OPEN"));

        assert!(FormatRecord::from_fields(&fields(&[("id", "x")])).is_none());
    }

    #[test]
    fn registry_lookup_by_id_and_key() {
        let open = FormatRecord {
            id: 17,
            key: "O".into(),
            name: "Open".into(),
            description: String::new(),
            lang: "en".into(),
            world_id: None,
        };
        let closed = FormatRecord {
            id: 4,
            key: "C".into(),
            ..open.clone()
        };
        let registry = FormatRegistry::new([open, closed]);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.by_key("C").map(|f| f.id), Some(4));
        assert_eq!(registry.by_id(17).map(|f| f.key.as_str()), Some("O"));
        assert!(registry.by_key("X").is_none());
        let ids: Vec<_> = registry.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![4, 17]);
    }
}
