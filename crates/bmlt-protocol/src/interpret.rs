//! Structural interpretation of untyped root server responses.
//!
//! Root server JSON carries no type tags. Objects are recognized by their key
//! sets using an ordered rule table where the first match wins; the order
//! matters because some fingerprints are subsets of others.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::trace;

use bmlt_core::{
    ChangeRecord, ChangeSnapshot, FormatRecord, LanguageRecord, MeetingRecord, PermissionEntry,
    PermissionLevel, ServerInfo, ServiceBodyRecord,
};

use crate::error::ServiceError;
use crate::number::normalize_number;

type Object = Map<String, Value>;

/// A classified JSON value.
#[derive(Debug)]
pub enum DomainValue {
    /// Meetings, with formats when the response carried both.
    SearchResults {
        meetings: Vec<MeetingRecord>,
        formats: Option<Vec<FormatRecord>>,
    },
    Formats(Vec<FormatRecord>),
    ChangeSnapshot(ChangeSnapshot),
    Change(Box<ChangeRecord>),
    Meeting(MeetingRecord),
    Format(FormatRecord),
    ServerInfo(ServerInfo),
    ServiceBody(ServiceBodyRecord),
    Language(LanguageRecord),
    Meetings(Vec<MeetingRecord>),
    Changes(Vec<ChangeRecord>),
    ServiceBodies(Vec<ServiceBodyRecord>),
    Languages(Vec<LanguageRecord>),
    Permissions(Vec<PermissionEntry>),
    /// An object matching no fingerprint, values classified recursively.
    Map(BTreeMap<String, DomainValue>),
    /// An array whose elements are not all of one domain type.
    List(Vec<DomainValue>),
    Text(String),
    Error(ServiceError),
}

impl DomainValue {
    /// Short name of the variant, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SearchResults { .. } => "search_results",
            Self::Formats(_) => "formats",
            Self::ChangeSnapshot(_) => "change_snapshot",
            Self::Change(_) => "change",
            Self::Meeting(_) => "meeting",
            Self::Format(_) => "format",
            Self::ServerInfo(_) => "server_info",
            Self::ServiceBody(_) => "service_body",
            Self::Language(_) => "language",
            Self::Meetings(_) => "meetings",
            Self::Changes(_) => "changes",
            Self::ServiceBodies(_) => "service_bodies",
            Self::Languages(_) => "languages",
            Self::Permissions(_) => "permissions",
            Self::Map(_) => "map",
            Self::List(_) => "list",
            Self::Text(_) => "text",
            Self::Error(_) => "error",
        }
    }

    /// Meetings carried by this value, if it is meeting-shaped.
    pub fn into_meetings(self) -> Option<Vec<MeetingRecord>> {
        match self {
            Self::Meetings(m) => Some(m),
            Self::Meeting(m) => Some(vec![m]),
            Self::SearchResults { meetings, .. } => Some(meetings),
            Self::List(items) if items.is_empty() => Some(Vec::new()),
            _ => None,
        }
    }

    /// Formats carried by this value, if it is format-shaped.
    pub fn into_formats(self) -> Option<Vec<FormatRecord>> {
        match self {
            Self::Formats(f) => Some(f),
            Self::Format(f) => Some(vec![f]),
            Self::SearchResults { formats, .. } => formats,
            Self::List(items) if items.is_empty() => Some(Vec::new()),
            _ => None,
        }
    }

    /// Change records carried by this value.
    pub fn into_changes(self) -> Option<Vec<ChangeRecord>> {
        match self {
            Self::Changes(c) => Some(c),
            Self::Change(c) => Some(vec![*c]),
            Self::List(items) if items.is_empty() => Some(Vec::new()),
            _ => None,
        }
    }

    /// The scalar string, if this is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Looks up a key in a generic map.
    pub fn get(&self, key: &str) -> Option<&DomainValue> {
        match self {
            Self::Map(map) => map.get(key),
            _ => None,
        }
    }
}

/// One entry of the fingerprint table.
struct Rule {
    name: &'static str,
    matches: fn(&Object) -> bool,
    build: fn(&Object) -> DomainValue,
}

/// Fingerprint rules in precedence order.
static RULES: &[Rule] = &[
    Rule {
        name: "meetings_and_formats",
        matches: |o| o.len() == 2 && o.contains_key("meetings") && o.contains_key("formats"),
        build: |o| DomainValue::SearchResults {
            meetings: list_of(&o["meetings"], DomainValue::into_meetings),
            formats: Some(list_of(&o["formats"], DomainValue::into_formats)),
        },
    },
    Rule {
        name: "meetings",
        matches: |o| o.len() == 1 && o.contains_key("meetings"),
        build: |o| DomainValue::SearchResults {
            meetings: list_of(&o["meetings"], DomainValue::into_meetings),
            formats: None,
        },
    },
    Rule {
        name: "change_snapshot",
        matches: |o| !o.is_empty() && o.len() <= 2 && o.keys().all(|k| k == "before" || k == "after"),
        build: |o| DomainValue::ChangeSnapshot(snapshot_from(o)),
    },
    Rule {
        name: "formats",
        matches: |o| o.len() == 1 && o.contains_key("formats"),
        build: |o| DomainValue::Formats(list_of(&o["formats"], DomainValue::into_formats)),
    },
    Rule {
        name: "change",
        matches: |o| o.contains_key("json_data"),
        build: |o| DomainValue::Change(Box::new(change_from(o))),
    },
    Rule {
        name: "meeting",
        matches: |o| has_all(o, MeetingRecord::FINGERPRINT),
        build: |o| DomainValue::Meeting(meeting_from(o)),
    },
    Rule {
        name: "format",
        matches: |o| has_all(o, FormatRecord::FINGERPRINT),
        build: |o| match FormatRecord::from_fields(&string_fields(o)) {
            Some(f) => DomainValue::Format(f),
            None => generic_map(o),
        },
    },
    Rule {
        name: "server_info",
        matches: |o| has_all(o, ServerInfo::FINGERPRINT),
        build: |o| DomainValue::ServerInfo(ServerInfo::from_fields(string_fields(o))),
    },
    Rule {
        name: "service_body",
        matches: |o| has_all(o, ServiceBodyRecord::FINGERPRINT),
        build: |o| match ServiceBodyRecord::from_fields(&string_fields(o)) {
            Some(sb) => DomainValue::ServiceBody(sb),
            None => generic_map(o),
        },
    },
    Rule {
        name: "language",
        matches: |o| {
            o.contains_key("name")
                && o.contains_key("key")
                && (o.len() == 2 || (o.len() == 3 && o.contains_key("default")))
        },
        build: |o| DomainValue::Language(language_from(o)),
    },
];

fn has_all(object: &Object, keys: &[&str]) -> bool {
    keys.iter().all(|k| object.contains_key(*k))
}

/// Name of the first rule matching an object, or `None` for a generic map.
pub fn matching_rule(object: &Object) -> Option<&'static str> {
    RULES.iter().find(|r| (r.matches)(object)).map(|r| r.name)
}

/// Classifies a decoded JSON value.
pub fn classify(value: &Value) -> DomainValue {
    match value {
        Value::Object(object) => classify_object(object),
        Value::Array(items) => classify_array(items),
        Value::String(s) => classify_text(s),
        Value::Number(n) => DomainValue::Text(normalize_number(n)),
        Value::Bool(b) => DomainValue::Text(bool_string(*b).to_string()),
        Value::Null => DomainValue::Error(ServiceError::no_data("null response")),
    }
}

/// Classifies an undecoded body (the server's bare-string answers).
pub fn classify_bytes(bytes: &[u8]) -> DomainValue {
    match std::str::from_utf8(bytes).map(str::trim) {
        Ok("") => DomainValue::Error(ServiceError::no_data("empty response")),
        Ok(text) => classify_text(text),
        Err(e) => DomainValue::Error(ServiceError::no_data("response is not UTF-8").with_source(e)),
    }
}

/// Top-level classification with the response-level unwrapping the server's
/// inconsistent shapes need: lone meetings and meeting arrays become search
/// results, lone formats become a format list.
pub fn interpret(value: &Value) -> DomainValue {
    match classify(value) {
        DomainValue::Meeting(m) => DomainValue::SearchResults {
            meetings: vec![m],
            formats: None,
        },
        DomainValue::Meetings(meetings) => DomainValue::SearchResults {
            meetings,
            formats: None,
        },
        DomainValue::Format(f) => DomainValue::Formats(vec![f]),
        other => other,
    }
}

fn classify_text(text: &str) -> DomainValue {
    match text {
        "ERROR" => DomainValue::Error(ServiceError::general("server reported ERROR")),
        "NOT AUTHORIZED" => {
            DomainValue::Error(ServiceError::incorrect_credentials("server reported NOT AUTHORIZED"))
        }
        other => DomainValue::Text(other.to_string()),
    }
}

fn classify_object(object: &Object) -> DomainValue {
    if let Some(rule) = RULES.iter().find(|r| (r.matches)(object)) {
        trace!(rule = rule.name, "fingerprint matched");
        return (rule.build)(object);
    }
    unwrap_languages(generic_map(object))
}

fn generic_map(object: &Object) -> DomainValue {
    if let Some(permissions) = permissions_from(object) {
        return DomainValue::Permissions(permissions);
    }
    DomainValue::Map(
        object
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k.clone(), classify(v)))
            .collect(),
    )
}

/// `{"languages": [...]}` carries a redundant wrapper.
fn unwrap_languages(value: DomainValue) -> DomainValue {
    match value {
        DomainValue::Map(mut map) if map.len() == 1 && map.contains_key("languages") => {
            match map.remove("languages") {
                Some(DomainValue::Languages(langs)) => DomainValue::Languages(langs),
                Some(DomainValue::Language(lang)) => DomainValue::Languages(vec![lang]),
                Some(other) => {
                    map.insert("languages".to_string(), other);
                    DomainValue::Map(map)
                }
                None => DomainValue::Map(map),
            }
        }
        other => other,
    }
}

fn classify_array(items: &[Value]) -> DomainValue {
    let classified: Vec<DomainValue> = items
        .iter()
        .filter(|v| !v.is_null())
        .map(classify)
        .collect();
    homogenize(classified)
}

/// Turns an array of one domain type into a typed list.
fn homogenize(items: Vec<DomainValue>) -> DomainValue {
    macro_rules! typed {
        ($variant:ident, $list:ident) => {
            if !items.is_empty() && items.iter().all(|i| matches!(i, DomainValue::$variant(_))) {
                return DomainValue::$list(
                    items
                        .into_iter()
                        .filter_map(|i| match i {
                            DomainValue::$variant(v) => Some(v),
                            _ => None,
                        })
                        .collect(),
                );
            }
        };
    }

    if items.len() == 1 && matches!(items[0], DomainValue::ServerInfo(_)) {
        return items.into_iter().next().unwrap_or(DomainValue::List(Vec::new()));
    }
    typed!(Meeting, Meetings);
    typed!(Format, Formats);
    typed!(ServiceBody, ServiceBodies);
    typed!(Language, Languages);
    if !items.is_empty() && items.iter().all(|i| matches!(i, DomainValue::Change(_))) {
        return DomainValue::Changes(
            items
                .into_iter()
                .filter_map(|i| match i {
                    DomainValue::Change(c) => Some(*c),
                    _ => None,
                })
                .collect(),
        );
    }
    DomainValue::List(items)
}

fn list_of<T>(value: &Value, extract: fn(DomainValue) -> Option<Vec<T>>) -> Vec<T> {
    extract(classify(value)).unwrap_or_default()
}

fn bool_string(b: bool) -> &'static str {
    if b { "1" } else { "0" }
}

/// Scalar rendering used for record fields: strings as-is, numbers
/// normalized, booleans as `1`/`0`, arrays of scalars comma-joined.
fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(normalize_number(n)),
        Value::Bool(b) => Some(bool_string(*b).to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter(|i| !i.is_array() && !i.is_object())
                .filter_map(scalar)
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Null | Value::Object(_) => None,
    }
}

fn string_fields(object: &Object) -> BTreeMap<String, String> {
    object
        .iter()
        .filter_map(|(k, v)| scalar(v).map(|s| (k.clone(), s)))
        .collect()
}

fn meeting_from(object: &Object) -> MeetingRecord {
    MeetingRecord::from_fields(string_fields(object))
}

fn snapshot_from(object: &Object) -> ChangeSnapshot {
    let side = |key: &str| match object.get(key) {
        Some(Value::Object(o)) => Some(meeting_from(o)),
        _ => None,
    };
    ChangeSnapshot {
        before: side("before"),
        after: side("after"),
    }
}

fn change_from(object: &Object) -> ChangeRecord {
    let fields = string_fields(object);
    let int = |k: &str| {
        fields
            .get(k)
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(0)
    };
    // json_data sides are meetings even when they lack the meeting fingerprint.
    let snapshot = match object.get("json_data") {
        Some(Value::Object(data)) => snapshot_from(data),
        _ => ChangeSnapshot::default(),
    };
    let mut change = ChangeRecord::new(int("change_id"), snapshot)
        .with_editor(fields.get("user_name").cloned().unwrap_or_default())
        .with_details(fields.get("details").map(String::as_str).unwrap_or_default())
        .with_meeting(
            int("meeting_id"),
            int("service_body_id"),
            fields.get("meeting_exists").is_some_and(|v| v == "1"),
        );
    if let Some(epoch) = fields.get("date_int").and_then(|v| v.trim().parse().ok()) {
        change = change.with_epoch(epoch);
    }
    change
}

fn language_from(object: &Object) -> LanguageRecord {
    let fields = string_fields(object);
    LanguageRecord::new(
        fields.get("key").cloned().unwrap_or_default(),
        fields.get("name").cloned().unwrap_or_default(),
    )
    .with_default(fields.get("default").is_some_and(|v| v == "1"))
}

/// Extracts `{"service_body": [...]}` or `{"service_body": {...}}`.
fn permissions_from(object: &Object) -> Option<Vec<PermissionEntry>> {
    if object.len() != 1 {
        return None;
    }
    let rows: Vec<&Object> = match object.get("service_body")? {
        Value::Object(single) => vec![single],
        Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
        _ => return None,
    };
    Some(
        rows.into_iter()
            .filter_map(|row| {
                let fields = string_fields(row);
                let id = fields.get("id")?.trim().parse().ok()?;
                let level = fields.get("permissions")?.trim().parse().ok()?;
                Some(PermissionEntry::new(
                    id,
                    fields.get("name").cloned().unwrap_or_default(),
                    PermissionLevel::from_wire(level),
                ))
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use serde_json::json;

    fn object(text: &str) -> Object {
        match serde_json::from_str(text).unwrap() {
            Value::Object(o) => o,
            other => panic!("not an object: {other}"),
        }
    }

    fn meeting_json(id: u32) -> Value {
        json!({
            "id_bigint": id.to_string(),
            "service_body_bigint": "3",
            "published": "1",
            "longitude": -73.5,
            "latitude": 40.25,
            "formats": "O,C",
            "meeting_name": format!("Meeting {id}"),
        })
    }

    fn format_json(id: u32, key: &str) -> Value {
        json!({
            "id": id.to_string(),
            "key_string": key,
            "name_string": key,
            "description_string": "",
            "lang": "en",
        })
    }

    #[test]
    fn rules_are_key_order_independent() {
        let cases = [
            (
                r#"{"meetings":[],"formats":[]}"#,
                r#"{ "formats" : [ ],
                    "meetings" : [ ] }"#,
                "meetings_and_formats",
            ),
            (r#"{"meetings":[]}"#, r#"{  "meetings":[ ]  }"#, "meetings"),
            (r#"{"before":{},"after":{}}"#, r#"{"after":{} , "before":{}}"#, "change_snapshot"),
            (r#"{"formats":[]}"#, r#"{ "formats": [] }"#, "formats"),
            (
                r#"{"change_id":"1","json_data":{}}"#,
                r#"{"json_data":{},"change_id":"1"}"#,
                "change",
            ),
            (
                r#"{"id_bigint":"1","service_body_bigint":"2","published":"1","longitude":"0","latitude":"0","formats":""}"#,
                r#"{"formats":"","latitude":"0","longitude":"0","published":"1","service_body_bigint":"2","id_bigint":"1"}"#,
                "meeting",
            ),
            (
                r#"{"key_string":"O","name_string":"Open","description_string":"","lang":"en","id":"1"}"#,
                r#"{"id":"1","lang":"en","description_string":"","name_string":"Open","key_string":"O"}"#,
                "format",
            ),
            (
                r#"{"available_keys":"","centerLatitude":"0","centerLongitude":"0","centerZoom":"6","changesPerMeeting":"5","version":"2.16.4","versionInt":"2016004"}"#,
                r#"{"versionInt":"2016004","version":"2.16.4","changesPerMeeting":"5","centerZoom":"6","centerLongitude":"0","centerLatitude":"0","available_keys":""}"#,
                "server_info",
            ),
            (
                r#"{"id":"1","parent_id":"0","name":"Region","description":""}"#,
                r#"{"description":"","name":"Region","parent_id":"0","id":"1"}"#,
                "service_body",
            ),
            (r#"{"key":"en","name":"English","default":true}"#, r#"{"default":true,"name":"English","key":"en"}"#, "language"),
        ];
        for (a, b, rule) in cases {
            assert_eq!(matching_rule(&object(a)), Some(rule), "{a}");
            assert_eq!(matching_rule(&object(b)), Some(rule), "{b}");
        }
        assert_eq!(matching_rule(&object(r#"{"anything":"else"}"#)), None);
    }

    #[test]
    fn precedence_prefers_earlier_rules() {
        // A meeting object that also has a json_data key is a change.
        let mut m = meeting_json(1);
        m["json_data"] = json!({});
        assert_eq!(matching_rule(m.as_object().unwrap()), Some("change"));

        // Language needs an exact key set.
        let lang_plus = object(r#"{"key":"en","name":"English","extra":"1"}"#);
        assert_eq!(matching_rule(&lang_plus), None);
    }

    #[test]
    fn combined_results_equal_each_half() {
        let meetings = json!([meeting_json(1), meeting_json(2)]);
        let formats = json!([format_json(1, "O"), format_json(2, "C")]);
        let combined = classify(&json!({"meetings": meetings, "formats": formats}));

        let DomainValue::SearchResults {
            meetings: both_meetings,
            formats: Some(both_formats),
        } = combined
        else {
            panic!("expected search results");
        };
        let alone_meetings = classify(&json!({ "meetings": meetings }))
            .into_meetings()
            .unwrap();
        let alone_formats = classify(&json!({ "formats": formats }))
            .into_formats()
            .unwrap();

        assert_eq!(both_meetings, alone_meetings);
        assert_eq!(both_formats, alone_formats);
        assert_eq!(both_meetings.len(), 2);
        assert_eq!(both_formats[1].key, "C");
    }

    #[test]
    fn meeting_fields_are_strings() {
        let value = classify(&json!({
            "id_bigint": 12,
            "service_body_bigint": "3",
            "published": true,
            "longitude": -73.5,
            "latitude": 40.0,
            "formats": ["O", "BT"],
            "comments": null,
        }));
        let DomainValue::Meeting(m) = value else {
            panic!("expected meeting");
        };
        assert_eq!(m.get("id_bigint"), Some("12"));
        assert_eq!(m.get("published"), Some("1"));
        assert_eq!(m.get("latitude"), Some("40"));
        assert_eq!(m.get("longitude"), Some("-73.5"));
        assert_eq!(m.formats_csv(), "BT,O");
        assert_eq!(m.get("comments"), None);
    }

    #[test]
    fn single_server_info_array_is_unwrapped() {
        let info = json!([{
            "available_keys": "id_bigint", "centerLatitude": "0", "centerLongitude": "0",
            "centerZoom": "6", "changesPerMeeting": "5", "version": "2.16.4", "versionInt": "2016004"
        }]);
        let DomainValue::ServerInfo(si) = classify(&info) else {
            panic!("expected server info");
        };
        assert_eq!(si.version_int(), 2_016_004);
    }

    #[test]
    fn arrays_become_typed_lists() {
        let bodies = json!([
            {"id": "1", "parent_id": "0", "name": "A", "description": ""},
            {"id": 2, "parent_id": 1, "name": "B", "description": "b"},
        ]);
        let DomainValue::ServiceBodies(sbs) = classify(&bodies) else {
            panic!("expected service bodies");
        };
        assert_eq!(sbs[1].parent_id, 1);

        let mixed = classify(&json!([format_json(1, "O"), "text"]));
        assert!(matches!(mixed, DomainValue::List(ref items) if items.len() == 2));
    }

    #[test]
    fn top_level_strings() {
        let err = classify(&json!("NOT AUTHORIZED"));
        assert!(matches!(err, DomainValue::Error(ref e) if e.code() == ErrorCode::IncorrectCredentials));

        let err = classify_bytes(b"ERROR");
        assert!(matches!(err, DomainValue::Error(ref e) if e.code() == ErrorCode::General));

        assert_eq!(classify_bytes(b"OK").as_text(), Some("OK"));
        assert_eq!(classify(&json!(1)).as_text(), Some("1"));

        let empty = classify_bytes(b"  ");
        assert!(matches!(empty, DomainValue::Error(ref e) if e.code() == ErrorCode::NoDataReceived));
        let invalid = classify_bytes(&[0xff, 0xfe]);
        assert!(matches!(invalid, DomainValue::Error(ref e) if e.code() == ErrorCode::NoDataReceived));
    }

    #[test]
    fn languages_wrapper_is_removed() {
        let value = classify(&json!({"languages": [
            {"key": "en", "name": "English", "default": true},
            {"key": "de", "name": "Deutsch"},
        ]}));
        let DomainValue::Languages(langs) = value else {
            panic!("expected languages");
        };
        assert!(langs[0].is_default);
        assert!(!langs[1].is_default);
    }

    #[test]
    fn permissions_single_and_list() {
        let single = classify(&json!({"service_body": {"id": "3", "name": "Area", "permissions": "2"}}));
        let DomainValue::Permissions(p) = single else {
            panic!("expected permissions");
        };
        assert_eq!(p, vec![PermissionEntry::new(3, "Area", PermissionLevel::Editor)]);

        let list = classify(&json!({"service_body": [
            {"id": 3, "name": "Area", "permissions": 2},
            {"id": 4, "name": "Region", "permissions": 1},
        ]}));
        let DomainValue::Permissions(p) = list else {
            panic!("expected permissions");
        };
        assert_eq!(p.len(), 2);
        assert_eq!(p[1].level, PermissionLevel::Observer);
    }

    #[test]
    fn change_records_embed_snapshots() {
        let changes = classify(&json!([{
            "change_id": "91",
            "date_int": "1500000000",
            "user_name": "Jo",
            "details": "&quot;x&quot;",
            "meeting_id": "42",
            "service_body_id": "3",
            "meeting_exists": "0",
            "json_data": {
                "before": {"id_bigint": "42", "meeting_name": "Old", "formats": ["C", "B"]}
            }
        }]));
        let DomainValue::Changes(list) = changes else {
            panic!("expected changes");
        };
        let change = &list[0];
        assert_eq!(change.change_id, 91);
        assert_eq!(change.meeting_id, 42);
        assert!(!change.meeting_exists);
        assert!(change.was_deleted());
        assert_eq!(change.details, "\"x\"");
        assert_eq!(change.before.as_ref().map(|b| b.formats_csv()), Some("B,C"));
        assert_eq!(change.timestamp.map(|t| t.timestamp()), Some(1_500_000_000));
    }

    #[test]
    fn interpret_wraps_lone_records() {
        let results = interpret(&meeting_json(5));
        assert!(matches!(results, DomainValue::SearchResults { ref meetings, formats: None } if meetings.len() == 1));

        let formats = interpret(&format_json(1, "O"));
        assert!(matches!(formats, DomainValue::Formats(ref f) if f.len() == 1));

        let array = interpret(&json!([meeting_json(1), meeting_json(2)]));
        assert!(matches!(array, DomainValue::SearchResults { ref meetings, .. } if meetings.len() == 2));
    }

    #[test]
    fn generic_maps_recurse() {
        let value = classify(&json!({
            "newMeeting": {"id": 77},
            "flag": false
        }));
        let Some(DomainValue::Map(inner)) = value.get("newMeeting") else {
            panic!("expected nested map");
        };
        assert_eq!(inner.get("id").and_then(DomainValue::as_text), Some("77"));
        assert_eq!(value.get("flag").and_then(DomainValue::as_text), Some("0"));
    }
}
