//! telemetry of a single remote device, converted from the raw json record right at the boundary

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::util::json::{first_bool, first_id, first_str, first_value};
use crate::util::time::{from_epoch_secs, parse_timestamp};

const ID_ALIASES: [&str; 3] = ["id", "uuid", "serial"];
const LAST_SEEN_ALIASES: [&str; 5] = [
    "last_seen",
    "lastSeen",
    "last_online_at",
    "lastHeartbeatAt",
    "last_heartbeat_at",
];
const NAME_ALIASES: [&str; 2] = ["name", "device_name"];
const LOCATION_ALIASES: [&str; 3] = ["location", "site", "place"];

pub const UNKNOWN_DEVICE_ID: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LastSeenValue {
    Epoch(f64),
    Text(String),
}

impl LastSeenValue {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64().map(LastSeenValue::Epoch),
            Value::String(s) => Some(LastSeenValue::Text(s.clone())),
            _ => None,
        }
    }

    /// None when the value cannot be read as a point in time
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            LastSeenValue::Epoch(secs) => from_epoch_secs(*secs),
            LastSeenValue::Text(text) => parse_timestamp(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceTelemetryDto {
    pub device_id: String,
    pub status: Option<String>,
    pub state: Option<String>,
    pub online: Option<bool>,
    pub is_online: Option<bool>,
    pub last_seen: Option<LastSeenValue>,
    pub name: Option<String>,
    pub location: Option<String>,
}

impl DeviceTelemetryDto {
    /// returns None when the record is not a json object
    pub fn from_json(json_data: &Value) -> Option<Self> {
        if !json_data.is_object() {
            return None;
        }
        let last_seen = first_value(json_data, &LAST_SEEN_ALIASES, |v| match v {
            Value::String(s) => !s.trim().is_empty(),
            Value::Number(n) => n.as_f64().map_or(false, |secs| secs != 0.0),
            _ => false,
        })
        .and_then(LastSeenValue::from_json);

        Some(DeviceTelemetryDto {
            device_id: first_id(json_data, &ID_ALIASES).unwrap_or_else(|| UNKNOWN_DEVICE_ID.to_string()),
            status: first_str(json_data, &["status"]),
            state: first_str(json_data, &["state"]),
            online: first_bool(json_data, &["online"]),
            is_online: first_bool(json_data, &["is_online"]),
            last_seen,
            name: first_str(json_data, &NAME_ALIASES),
            location: first_str(json_data, &LOCATION_ALIASES),
        })
    }

    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("Device {}", self.device_id),
        }
    }

    pub fn display_location(&self) -> &str {
        self.location.as_deref().unwrap_or("—")
    }

    /// last seen as the device api sent it, for mails
    pub fn display_last_seen(&self) -> String {
        match &self.last_seen {
            Some(LastSeenValue::Text(text)) => text.clone(),
            Some(LastSeenValue::Epoch(secs)) => secs.to_string(),
            None => String::from("N/D"),
        }
    }

    pub fn last_seen_at(&self) -> Option<DateTime<Utc>> {
        self.last_seen.as_ref().and_then(|v| v.to_datetime())
    }
}

#[cfg(test)]
impl DeviceTelemetryDto {
    /// empty record for a given id, every signal absent
    pub fn new(device_id: &str) -> Self {
        DeviceTelemetryDto {
            device_id: device_id.to_string(),
            status: None,
            state: None,
            online: None,
            is_online: None,
            last_seen: None,
            name: None,
            location: None,
        }
    }
}
