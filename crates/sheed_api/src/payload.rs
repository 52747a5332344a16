use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

/// Request body for `POST /`.
///
/// All numeric form fields travel as strings; the server parses them. Only
/// `snap` is normalized client-side to `1`/`0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    /// `"<lat>, <lon>"` as typed into the form.
    pub coordinates: String,
    pub name: String,
    pub expand_factor: String,
    /// Session identifier of the log channel at submission time; may be empty
    /// or stale, in which case streamed logs for this job are not correlated.
    pub client_id: String,
    pub dem: String,
    pub snap: SnapFlag,
}

impl JobRequest {
    pub fn new(
        coordinates: impl Into<String>,
        name: impl Into<String>,
        expand_factor: impl Into<String>,
        client_id: impl Into<String>,
        dem: impl Into<String>,
        snap: bool,
    ) -> Self {
        Self {
            coordinates: coordinates.into(),
            name: name.into(),
            expand_factor: expand_factor.into(),
            client_id: client_id.into(),
            dem: dem.into(),
            snap: SnapFlag(snap),
        }
    }

    pub fn has_client_id(&self) -> bool {
        !self.client_id.trim().is_empty()
    }
}

/// Checkbox state encoded as the integer `1` or `0` on the wire.
///
/// Decoding also accepts booleans and the strings `"1"`, `"0"`, `"on"`,
/// `"true"`, `"false"` so hand-written request files stay loadable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapFlag(pub bool);

impl SnapFlag {
    pub fn as_u8(self) -> u8 {
        u8::from(self.0)
    }
}

impl From<bool> for SnapFlag {
    fn from(value: bool) -> Self {
        Self(value)
    }
}

impl Serialize for SnapFlag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for SnapFlag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(SnapFlagVisitor)
    }
}

struct SnapFlagVisitor;

impl Visitor<'_> for SnapFlagVisitor {
    type Value = SnapFlag;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("0, 1, a boolean, or a checkbox string")
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<SnapFlag, E> {
        Ok(SnapFlag(value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<SnapFlag, E> {
        match value {
            0 => Ok(SnapFlag(false)),
            1 => Ok(SnapFlag(true)),
            other => Err(E::invalid_value(de::Unexpected::Unsigned(other), &self)),
        }
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<SnapFlag, E> {
        match value {
            0 => Ok(SnapFlag(false)),
            1 => Ok(SnapFlag(true)),
            other => Err(E::invalid_value(de::Unexpected::Signed(other), &self)),
        }
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<SnapFlag, E> {
        match value.trim() {
            "1" | "on" | "true" => Ok(SnapFlag(true)),
            "0" | "" | "off" | "false" => Ok(SnapFlag(false)),
            other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
        }
    }
}

/// Response body of a completed delineation job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    pub lat: f64,
    pub lon: f64,
    /// KML artifact path relative to the origin.
    pub kml: String,
    /// GeoJSON artifact path relative to the origin.
    pub geojson: String,
    /// Set when the catchment touched the DEM edge even after the server's
    /// retry with a larger box.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clipped: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dem: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expand_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl JobResult {
    pub fn was_clipped(&self) -> bool {
        self.clipped.unwrap_or(false)
    }
}
