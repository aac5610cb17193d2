//! Meeting records.
//!
//! A meeting is an open-ended map of string fields. Read-only meetings are
//! plain [`MeetingRecord`]s; editing goes through [`EditableMeeting`], which
//! owns the only setters and tracks changes against the snapshot it was
//! created from.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::server_info::{STANDARD_MEETING_KEYS, ServerInfo};

pub const ID_KEY: &str = "id_bigint";
pub const SERVICE_BODY_KEY: &str = "service_body_bigint";
pub const WEEKDAY_KEY: &str = "weekday_tinyint";
pub const START_TIME_KEY: &str = "start_time";
pub const DURATION_KEY: &str = "duration_time";
pub const FORMATS_KEY: &str = "formats";
pub const PUBLISHED_KEY: &str = "published";
pub const NAME_KEY: &str = "meeting_name";
pub const LONGITUDE_KEY: &str = "longitude";
pub const LATITUDE_KEY: &str = "latitude";
pub const WORLD_ID_KEY: &str = "worldid_mixed";
pub const COMMENTS_KEY: &str = "comments";

/// Longest duration a meeting may have, exclusive.
pub const MAX_DURATION_MINUTES: u32 = 24 * 60;

/// Sorts and joins a comma-separated format list.
///
/// Empty entries are dropped and duplicates collapse, so two lists with the
/// same members always produce the same string.
pub fn normalize_formats<'a>(keys: impl IntoIterator<Item = &'a str>) -> String {
    keys.into_iter()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>()
        .join(",")
}

/// A meeting as delivered by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeetingRecord {
    fields: BTreeMap<String, String>,
}

impl MeetingRecord {
    /// Keys whose presence identifies a meeting object.
    pub const FINGERPRINT: &'static [&'static str] = &[
        SERVICE_BODY_KEY,
        ID_KEY,
        PUBLISHED_KEY,
        LONGITUDE_KEY,
        LATITUDE_KEY,
        FORMATS_KEY,
    ];

    /// Wraps server fields, normalizing the format list.
    pub fn from_fields(mut fields: BTreeMap<String, String>) -> Self {
        if let Some(formats) = fields.get_mut(FORMATS_KEY) {
            *formats = normalize_formats(formats.split(','));
        }
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn into_fields(self) -> BTreeMap<String, String> {
        self.fields
    }

    fn int(&self, key: &str) -> i64 {
        self.get(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    }

    /// Field keys with the standard ones first, then the rest alphabetically.
    pub fn keys_ordered(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = STANDARD_MEETING_KEYS
            .iter()
            .copied()
            .chain(std::iter::once(PUBLISHED_KEY))
            .filter(|k| self.fields.contains_key(*k))
            .collect();
        let rest: Vec<&str> = self
            .fields
            .keys()
            .map(String::as_str)
            .filter(|k| !keys.contains(k))
            .collect();
        keys.extend(rest);
        keys
    }

    /// Meeting id; 0 for a meeting that was never saved.
    pub fn id(&self) -> i64 {
        self.int(ID_KEY)
    }

    pub fn service_body_id(&self) -> i64 {
        self.int(SERVICE_BODY_KEY)
    }

    /// Weekday, 1 = Sunday through 7 = Saturday.
    pub fn weekday(&self) -> Option<u8> {
        self.get(WEEKDAY_KEY)
            .and_then(|v| v.trim().parse().ok())
            .filter(|d| (1..=7).contains(d))
    }

    pub fn start_time(&self) -> Option<NaiveTime> {
        self.get(START_TIME_KEY).and_then(parse_clock)
    }

    pub fn duration_minutes(&self) -> Option<u32> {
        self.get(DURATION_KEY)
            .and_then(parse_clock)
            .map(|t| t.hour() * 60 + t.minute())
    }

    pub fn name(&self) -> &str {
        self.get(NAME_KEY).unwrap_or_default()
    }

    pub fn published(&self) -> bool {
        self.get(PUBLISHED_KEY).is_some_and(|v| v == "1")
    }

    /// (latitude, longitude), when both parse.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let lat = self.get(LATITUDE_KEY)?.trim().parse().ok()?;
        let lng = self.get(LONGITUDE_KEY)?.trim().parse().ok()?;
        Some((lat, lng))
    }

    /// The sorted, comma-joined format keys.
    pub fn formats_csv(&self) -> &str {
        self.get(FORMATS_KEY).unwrap_or_default()
    }

    pub fn format_keys(&self) -> Vec<&str> {
        self.formats_csv()
            .split(',')
            .filter(|k| !k.is_empty())
            .collect()
    }

    pub fn world_id(&self) -> &str {
        self.get(WORLD_ID_KEY).unwrap_or_default()
    }

    pub fn comments(&self) -> &str {
        self.get(COMMENTS_KEY).unwrap_or_default()
    }

    /// Distance from the search centre in miles, for radius searches.
    pub fn distance_miles(&self) -> Option<f64> {
        self.get("distance_in_miles")?.trim().parse().ok()
    }

    /// Distance from the search centre in kilometres, for radius searches.
    pub fn distance_km(&self) -> Option<f64> {
        self.get("distance_in_km")?.trim().parse().ok()
    }

    /// Content equality ignoring the id.
    ///
    /// Records with different key counts always differ. The format list is
    /// compared as a set.
    pub fn same_content(&self, other: &Self) -> bool {
        if self.fields.len() != other.fields.len() {
            return false;
        }
        self.fields
            .iter()
            .filter(|(k, _)| k.as_str() != ID_KEY)
            .all(|(k, v)| match other.fields.get(k) {
                Some(o) if k == FORMATS_KEY => {
                    normalize_formats(v.split(',')) == normalize_formats(o.split(','))
                }
                Some(o) => o == v,
                None => false,
            })
    }

    /// Keys whose values differ from `other`, including keys on one side only.
    pub fn differing_keys(&self, other: &Self) -> Vec<String> {
        let keys: BTreeSet<&String> = self.fields.keys().chain(other.fields.keys()).collect();
        keys.into_iter()
            .filter(|k| self.fields.get(*k) != other.fields.get(*k))
            .cloned()
            .collect()
    }
}

fn parse_clock(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

fn clock_string(hours: u32, minutes: u32) -> String {
    format!("{:02}:{:02}:00", hours, minutes)
}

/// A meeting the logged-in admin may change.
///
/// Holds the working copy and the snapshot it started from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditableMeeting {
    current: MeetingRecord,
    original: MeetingRecord,
}

impl EditableMeeting {
    pub fn new(record: MeetingRecord) -> Self {
        Self {
            original: record.clone(),
            current: record,
        }
    }

    /// A blank meeting for creation, seeded with the server's available keys.
    pub fn template(info: &ServerInfo, service_body_id: i64) -> Self {
        let mut fields: BTreeMap<String, String> = info
            .available_keys()
            .into_iter()
            .map(|k| (k, String::new()))
            .collect();
        let (lat, lng) = info.center().unwrap_or((0.0, 0.0));
        fields.insert(ID_KEY.into(), "0".into());
        fields.insert(PUBLISHED_KEY.into(), "0".into());
        fields.insert(SERVICE_BODY_KEY.into(), service_body_id.to_string());
        fields.insert(WEEKDAY_KEY.into(), "1".into());
        fields.insert(START_TIME_KEY.into(), "22:00:00".into());
        let duration = info
            .default_duration_minutes()
            .filter(|&m| m < MAX_DURATION_MINUTES)
            .unwrap_or(60);
        fields.insert(
            DURATION_KEY.into(),
            clock_string(duration / 60, duration % 60),
        );
        fields.insert(LATITUDE_KEY.into(), lat.to_string());
        fields.insert(LONGITUDE_KEY.into(), lng.to_string());
        fields.insert(FORMATS_KEY.into(), String::new());
        fields.insert(NAME_KEY.into(), "New Meeting".into());
        Self::new(MeetingRecord::from_fields(fields))
    }

    /// The working copy.
    pub fn record(&self) -> &MeetingRecord {
        &self.current
    }

    /// The snapshot taken at construction or at the last save.
    pub fn original(&self) -> &MeetingRecord {
        &self.original
    }

    pub fn into_record(self) -> MeetingRecord {
        self.current
    }

    pub fn id(&self) -> i64 {
        self.current.id()
    }

    /// True when any field other than the id differs from the snapshot.
    pub fn is_dirty(&self) -> bool {
        !self.current.same_content(&self.original)
    }

    /// Keys changed since the snapshot, excluding the id.
    pub fn changed_fields(&self) -> Vec<String> {
        self.current
            .differing_keys(&self.original)
            .into_iter()
            .filter(|k| k != ID_KEY)
            .collect()
    }

    pub fn value_changed(&self, key: &str) -> bool {
        if key == FORMATS_KEY {
            return self.current.formats_csv() != self.original.formats_csv();
        }
        self.current.get(key) != self.original.get(key)
    }

    /// Sets an arbitrary field. The id cannot be changed this way.
    pub fn set_field(&mut self, key: &str, value: impl Into<String>) -> bool {
        if key == ID_KEY {
            return false;
        }
        let value = value.into();
        let value = if key == FORMATS_KEY {
            normalize_formats(value.split(','))
        } else {
            value
        };
        self.current.fields.insert(key.to_string(), value);
        true
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.set_field(NAME_KEY, name);
    }

    pub fn set_published(&mut self, published: bool) {
        self.set_field(PUBLISHED_KEY, if published { "1" } else { "0" });
    }

    pub fn set_service_body_id(&mut self, id: i64) {
        self.set_field(SERVICE_BODY_KEY, id.to_string());
    }

    pub fn set_world_id(&mut self, world_id: impl Into<String>) {
        self.set_field(WORLD_ID_KEY, world_id);
    }

    pub fn set_comments(&mut self, comments: impl Into<String>) {
        self.set_field(COMMENTS_KEY, comments);
    }

    /// Sets (latitude, longitude); `None` stores zeros.
    pub fn set_coordinates(&mut self, coordinates: Option<(f64, f64)>) {
        let (lat, lng) = coordinates.unwrap_or((0.0, 0.0));
        self.set_field(LATITUDE_KEY, lat.to_string());
        self.set_field(LONGITUDE_KEY, lng.to_string());
    }

    /// Sets the weekday; values outside 1..=7 are rejected.
    pub fn set_weekday(&mut self, weekday: u8) -> bool {
        if !(1..=7).contains(&weekday) {
            return false;
        }
        self.set_field(WEEKDAY_KEY, weekday.to_string())
    }

    /// Sets the start time. Midnight is stored as 23:59.
    pub fn set_start_time(&mut self, time: NaiveTime) {
        let (hours, minutes) = match (time.hour(), time.minute()) {
            (0, 0) => (23, 59),
            hm => hm,
        };
        self.set_field(START_TIME_KEY, clock_string(hours, minutes));
    }

    /// Sets the duration; a full day or more is rejected.
    pub fn set_duration_minutes(&mut self, minutes: u32) -> bool {
        if minutes >= MAX_DURATION_MINUTES {
            return false;
        }
        self.set_field(DURATION_KEY, clock_string(minutes / 60, minutes % 60))
    }

    /// Replaces the format list. Stored sorted whatever the input order.
    pub fn set_formats<'a>(&mut self, keys: impl IntoIterator<Item = &'a str>) {
        let csv = normalize_formats(keys);
        self.current.fields.insert(FORMATS_KEY.to_string(), csv);
    }

    pub fn add_format(&mut self, key: &str) {
        let mut keys = self.current.format_keys();
        keys.push(key);
        let csv = normalize_formats(keys);
        self.current.fields.insert(FORMATS_KEY.to_string(), csv);
    }

    pub fn remove_format(&mut self, key: &str) {
        let csv = normalize_formats(self.current.format_keys().into_iter().filter(|k| *k != key));
        self.current.fields.insert(FORMATS_KEY.to_string(), csv);
    }

    /// Throws away all edits.
    pub fn restore_to_original(&mut self) {
        self.current = self.original.clone();
    }

    /// Loads the field values of an earlier snapshot, keeping the id.
    pub fn revert_to(&mut self, before: &MeetingRecord) {
        let id = self.current.get(ID_KEY).map(str::to_string);
        self.current = before.clone();
        if let Some(id) = id {
            self.current.fields.insert(ID_KEY.to_string(), id);
        }
    }

    /// Makes the working copy the new snapshot after a successful save.
    pub fn mark_saved(&mut self) {
        self.original = self.current.clone();
    }

    /// Assigns the server-issued id after creation.
    pub fn assign_id(&mut self, id: i64) {
        self.current.fields.insert(ID_KEY.to_string(), id.to_string());
    }

    /// `(key, value)` pairs to send on save: every field for a new meeting,
    /// only the changed ones otherwise.
    pub fn save_fields(&self) -> Vec<(String, String)> {
        let keys: Vec<String> = if self.id() == 0 {
            self.current
                .fields
                .keys()
                .filter(|k| k.as_str() != ID_KEY)
                .cloned()
                .collect()
        } else {
            self.changed_fields()
        };
        keys.into_iter()
            .map(|k| {
                let v = self.current.get(&k).unwrap_or_default().to_string();
                (k, v)
            })
            .collect()
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

    fn sample() -> MeetingRecord {
        meeting(&[
            ("id_bigint", "12"),
            ("service_body_bigint", "3"),
            ("weekday_tinyint", "2"),
            ("start_time", "19:30:00"),
            ("duration_time", "01:30:00"),
            ("formats", "O,BT,C"),
            ("meeting_name", "Tuesday Night"),
            ("published", "1"),
            ("latitude", "40.5"),
            ("longitude", "-73.25"),
        ])
    }

    #[test]
    fn formats_are_stored_sorted() {
        let m = sample();
        assert_eq!(m.formats_csv(), "BT,C,O");
        assert_eq!(m.format_keys(), vec!["BT", "C", "O"]);
    }

    #[test]
    fn typed_accessors() {
        let m = sample();
        assert_eq!(m.id(), 12);
        assert_eq!(m.service_body_id(), 3);
        assert_eq!(m.weekday(), Some(2));
        assert_eq!(m.start_time(), NaiveTime::from_hms_opt(19, 30, 0));
        assert_eq!(m.duration_minutes(), Some(90));
        assert!(m.published());
        assert_eq!(m.coordinates(), Some((40.5, -73.25)));
        assert_eq!(meeting(&[("weekday_tinyint", "9")]).weekday(), None);
    }

    #[test]
    fn keys_ordered_puts_standard_keys_first() {
        let m = meeting(&[("zzz", "1"), ("meeting_name", "x"), ("id_bigint", "1"), ("aaa", "2")]);
        assert_eq!(m.keys_ordered(), vec!["id_bigint", "meeting_name", "aaa", "zzz"]);
    }

    #[test]
    fn format_list_round_trip_is_sorted_and_idempotent() {
        let mut e = EditableMeeting::new(sample());
        e.set_formats(["B", "A"]);
        assert_eq!(e.record().formats_csv(), "A,B");

        let read_back: Vec<&str> = e.record().format_keys();
        let again = read_back.join(",");
        e.set_formats(again.split(','));
        assert_eq!(e.record().formats_csv(), "A,B");

        e.set_formats(["A", "B"]);
        assert_eq!(e.record().formats_csv(), "A,B");
    }

    #[test]
    fn dirty_tracking_lifecycle() {
        let mut e = EditableMeeting::new(sample());
        assert!(!e.is_dirty());

        e.set_name("Renamed");
        assert!(e.is_dirty());
        assert_eq!(e.changed_fields(), vec!["meeting_name"]);
        assert!(e.value_changed("meeting_name"));

        e.set_name("Tuesday Night");
        assert!(!e.is_dirty());
    }

    #[test]
    fn format_order_alone_is_not_dirty() {
        let mut e = EditableMeeting::new(sample());
        e.set_field("formats", "O,C,BT");
        assert!(!e.is_dirty());

        e.remove_format("C");
        assert!(e.is_dirty());
        e.add_format("C");
        assert!(!e.is_dirty());
    }

    #[test]
    fn id_is_immutable_through_setters() {
        let mut e = EditableMeeting::new(sample());
        assert!(!e.set_field("id_bigint", "99"));
        assert_eq!(e.id(), 12);
        assert!(!e.is_dirty());
    }

    #[test]
    fn validated_setters() {
        let mut e = EditableMeeting::new(sample());
        assert!(!e.set_weekday(0));
        assert!(!e.set_weekday(8));
        assert!(e.set_weekday(7));
        assert_eq!(e.record().weekday(), Some(7));

        assert!(!e.set_duration_minutes(1440));
        assert!(e.set_duration_minutes(75));
        assert_eq!(e.record().get("duration_time"), Some("01:15:00"));

        e.set_start_time(NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        assert_eq!(e.record().get("start_time"), Some("23:59:00"));
    }

    #[test]
    fn restore_and_mark_saved() {
        let mut e = EditableMeeting::new(sample());
        e.set_published(false);
        e.set_comments("bring coffee");
        assert_eq!(e.changed_fields(), vec!["comments", "published"]);

        e.restore_to_original();
        assert!(!e.is_dirty());

        e.set_published(false);
        e.mark_saved();
        assert!(!e.is_dirty());
        assert!(!e.original().published());
    }

    #[test]
    fn revert_keeps_id() {
        let mut e = EditableMeeting::new(sample());
        let before = meeting(&[("id_bigint", "0"), ("meeting_name", "Old")]);
        e.revert_to(&before);
        assert_eq!(e.id(), 12);
        assert_eq!(e.record().name(), "Old");
        assert!(e.is_dirty());
    }

    #[test]
    fn save_fields_for_new_and_existing() {
        let mut e = EditableMeeting::new(sample());
        e.set_name("Changed");
        assert_eq!(
            e.save_fields(),
            vec![("meeting_name".to_string(), "Changed".to_string())]
        );

        let mut info_fields = BTreeMap::new();
        info_fields.insert("available_keys".to_string(), "id_bigint,meeting_name,comments".to_string());
        let new = EditableMeeting::template(&ServerInfo::from_fields(info_fields), 5);
        let keys: Vec<String> = new.save_fields().into_iter().map(|(k, _)| k).collect();
        assert!(keys.contains(&"comments".to_string()));
        assert!(keys.contains(&"service_body_bigint".to_string()));
        assert!(!keys.contains(&"id_bigint".to_string()));
        assert_eq!(new.record().service_body_id(), 5);
    }

    #[test]
    fn template_duration_stays_under_a_day() {
        let with_duration = |raw: &str| {
            let mut fields = BTreeMap::new();
            fields.insert("defaultDuration".to_string(), raw.to_string());
            EditableMeeting::template(&ServerInfo::from_fields(fields), 2)
        };

        let normal = with_duration("01:30:00");
        assert_eq!(normal.record().duration_minutes(), Some(90));

        let too_long = with_duration("25:00:00");
        assert_eq!(too_long.record().get("duration_time"), Some("01:00:00"));
        assert_eq!(too_long.record().duration_minutes(), Some(60));

        let overflowing = with_duration("99999999:00");
        assert_eq!(overflowing.record().duration_minutes(), Some(60));
    }
}
