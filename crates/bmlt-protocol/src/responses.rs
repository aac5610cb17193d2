//! Parsers for the admin endpoints' small, irregular responses.
//!
//! These answers do not carry a record fingerprint, so they are read
//! straight from the decoded JSON instead of going through the interpreter.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::number::normalize_number;

/// Field-level result of a meeting save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MeetingChange {
    pub meeting_id: i64,
    /// Changed key ⇒ (old value, new value).
    pub fields: BTreeMap<String, (String, String)>,
}

impl MeetingChange {
    /// Reads a `changeMeeting` response; `None` when the body has no
    /// `changeMeeting` member.
    pub fn from_response(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let meeting_id = object
            .get("changeMeeting")?
            .get("id")
            .and_then(int_value)
            .unwrap_or(0);

        let mut fields = BTreeMap::new();
        match object.get("field") {
            Some(Value::Object(single)) => {
                if let (Some(key), Some(old), Some(new)) = (
                    single.get("key").and_then(Value::as_str),
                    object.get("oldValue").and_then(Value::as_str),
                    object.get("newValue").and_then(Value::as_str),
                ) {
                    fields.insert(key.to_string(), (old.to_string(), new.to_string()));
                }
            }
            Some(Value::Array(items)) => {
                for item in items {
                    let key = item
                        .get("@attributes")
                        .and_then(|a| a.get("key"))
                        .and_then(Value::as_str);
                    let old = item.get("oldValue").and_then(Value::as_str);
                    let new = item.get("newValue").and_then(Value::as_str);
                    if let (Some(key), Some(old), Some(new)) = (key, old, new) {
                        fields.insert(key.to_string(), (old.to_string(), new.to_string()));
                    }
                }
            }
            _ => {}
        }
        Some(Self { meeting_id, fields })
    }
}

impl fmt::Display for MeetingChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Meeting Change for Meeting ID {}", self.meeting_id)?;
        for (key, (old, new)) in &self.fields {
            write!(f, "\n{} changed from {} to {}", key, old, new)?;
        }
        Ok(())
    }
}

/// Reads an integer that the server may send as a string or a number.
pub fn int_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => normalize_number(n).parse().ok(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// The id in a `{"newMeeting": {"id": ..}}` response.
pub fn new_meeting_id(value: &Value) -> Option<i64> {
    value.get("newMeeting")?.get("id").and_then(int_value)
}

/// The id in a `{"meeting_id": ..}` response, used by delete, restore and
/// rollback. Zero and missing ids yield `None`.
pub fn affected_meeting_id(value: &Value) -> Option<i64> {
    value
        .get("meeting_id")
        .and_then(int_value)
        .filter(|id| *id != 0)
}

/// Interprets a contact-form answer; `Ok` on `"1"`, otherwise the raw status.
pub fn mail_status(body: &str) -> Result<(), &str> {
    match body.trim() {
        "1" => Ok(()),
        other => Err(other),
    }
}
