//! Server language list entries.

use serde::{Deserialize, Serialize};

/// A language the server is localized for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageRecord {
    pub key: String,
    pub name: String,
    pub is_default: bool,
}

impl LanguageRecord {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            is_default: false,
        }
    }

    pub fn with_default(mut self, is_default: bool) -> Self {
        self.is_default = is_default;
        self
    }
}

/// Recomputes the default flag from the server's native language.
///
/// The server's own `default` flag is unreliable; the native language named
/// in the server info wins.
pub fn mark_native_language(languages: &mut [LanguageRecord], native_lang: &str) {
    for lang in languages.iter_mut() {
        lang.is_default = lang.key == native_lang;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_language_becomes_default() {
        let mut langs = vec![
            LanguageRecord::new("en", "English").with_default(true),
            LanguageRecord::new("de", "Deutsch"),
        ];
        mark_native_language(&mut langs, "de");
        assert!(!langs[0].is_default);
        assert!(langs[1].is_default);
    }
}
