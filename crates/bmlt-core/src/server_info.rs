//! Root server metadata returned by the server-test call.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Oldest root server release this client talks to (2.8.12).
pub const MIN_SERVER_VERSION: u32 = 2_008_012;

/// Meeting fields every supported server must expose in `available_keys`.
pub const STANDARD_MEETING_KEYS: &[&str] = &[
    "id_bigint",
    "service_body_bigint",
    "weekday_tinyint",
    "start_time",
    "duration_time",
    "formats",
    "longitude",
    "latitude",
    "meeting_name",
    "location_text",
    "location_info",
    "location_street",
    "location_city_subsection",
    "location_neighborhood",
    "location_municipality",
    "location_sub_province",
    "location_province",
    "location_postal_code_1",
    "comments",
];

/// Unit used by the server for distance searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceUnits {
    Miles,
    Kilometers,
    Unknown,
}

impl DistanceUnits {
    /// Parses the wire value (`mi` / `km`).
    pub fn from_wire(value: &str) -> Self {
        match value.trim() {
            "mi" => Self::Miles,
            "km" => Self::Kilometers,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Miles => "mi",
            Self::Kilometers => "km",
            Self::Unknown => "",
        }
    }
}

/// Server metadata.
///
/// Stored as the raw string map the server sent; accessors interpret the
/// individual fields. A `ServerInfo` is never mutated after it is accepted by
/// the handshake, a reconnect replaces it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerInfo {
    fields: BTreeMap<String, String>,
}

impl ServerInfo {
    /// Keys whose presence identifies a server-info object.
    pub const FINGERPRINT: &'static [&'static str] = &[
        "available_keys",
        "centerLatitude",
        "centerLongitude",
        "centerZoom",
        "changesPerMeeting",
        "version",
        "versionInt",
    ];

    pub fn from_fields(fields: BTreeMap<String, String>) -> Self {
        Self { fields }
    }

    /// Returns a raw field.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    fn flag(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| v != "0" && !v.is_empty())
    }

    fn csv(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Dotted version string, e.g. `2.16.4`.
    pub fn version(&self) -> &str {
        self.get("version").unwrap_or_default()
    }

    /// Packed version (`XYYYZZZ`); 0 when missing or malformed.
    pub fn version_int(&self) -> u32 {
        self.get("versionInt")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    }

    /// Splits the packed version into (major, feature, fix).
    pub fn version_parts(&self) -> (u32, u32, u32) {
        let v = self.version_int();
        (v / 1_000_000, (v / 1000) % 1000, v % 1000)
    }

    /// True when the server is at least [`MIN_SERVER_VERSION`].
    pub fn meets_min_version(&self, min: u32) -> bool {
        self.version_int() >= min
    }

    /// Meeting keys the server supports.
    pub fn available_keys(&self) -> Vec<String> {
        self.csv("available_keys")
    }

    /// Standard meeting keys absent from `available_keys`.
    pub fn missing_standard_keys(&self) -> Vec<&'static str> {
        let available = self.available_keys();
        STANDARD_MEETING_KEYS
            .iter()
            .copied()
            .filter(|k| !available.iter().any(|a| a == k))
            .collect()
    }

    /// Keys compared when diffing change records.
    pub fn diff_keys(&self) -> Vec<String> {
        let mut keys = self.available_keys();
        if !keys.iter().any(|k| k == "published") {
            keys.push("published".to_string());
        }
        keys
    }

    /// Map centre as (latitude, longitude).
    pub fn center(&self) -> Option<(f64, f64)> {
        let lat = self.get("centerLatitude")?.trim().parse().ok()?;
        let lng = self.get("centerLongitude")?.trim().parse().ok()?;
        Some((lat, lng))
    }

    pub fn center_zoom(&self) -> u32 {
        self.get("centerZoom")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    }

    /// How many changes per meeting the server retains.
    pub fn changes_per_meeting(&self) -> u32 {
        self.get("changesPerMeeting")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    }

    pub fn char_set(&self) -> &str {
        self.get("charSet").unwrap_or_default()
    }

    /// Default meeting duration in minutes, from `HH:MM[:SS]`.
    pub fn default_duration_minutes(&self) -> Option<u32> {
        let raw = self.get("defaultDuration")?;
        let mut parts = raw.split(':').map(|p| p.trim().parse::<u32>());
        let hours = parts.next()?.ok()?;
        let minutes = match parts.next() {
            Some(m) => m.ok()?,
            None => 0,
        };
        hours.checked_mul(60)?.checked_add(minutes)
    }

    pub fn distance_units(&self) -> DistanceUnits {
        self.get("distanceUnits")
            .map(DistanceUnits::from_wire)
            .unwrap_or(DistanceUnits::Unknown)
    }

    pub fn email_enabled(&self) -> bool {
        self.flag("emailEnabled")
    }

    pub fn email_includes_service_bodies(&self) -> bool {
        self.flag("emailIncludesServiceBodies")
    }

    pub fn google_api_key(&self) -> &str {
        self.get("google_api_key").unwrap_or_default()
    }

    /// Language keys the server is localized for.
    pub fn langs(&self) -> Vec<String> {
        self.csv("langs")
    }

    pub fn native_lang(&self) -> &str {
        self.get("nativeLang").unwrap_or_default()
    }

    pub fn region_bias(&self) -> &str {
        self.get("regionBias").unwrap_or_default()
    }

    /// True when semantic administration (the admin API) is enabled.
    pub fn semantic_admin(&self) -> bool {
        self.flag("semanticAdmin")
    }
}

impl fmt::Display for ServerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (major, feature, fix) = self.version_parts();
        write!(f, "root server {} ({}.{}.{})", self.version(), major, feature, fix)
    }
}
