//! timestamp parsing for the last-seen field of remote devices
//! unsupported input yields None, it never errors

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// zone-less formats, assumed to be UTC
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// numeric offset without colon, e.g. 2025-09-01T12:34:56+0000
const OFFSET_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// epoch seconds, fractional part kept as nanoseconds
pub fn from_epoch_secs(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    let whole = secs.trunc();
    if whole > i64::MAX as f64 {
        return None;
    }
    let nanos = ((secs - whole) * 1_000_000_000.0) as u32;
    Utc.timestamp_opt(whole as i64, nanos).single()
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.chars().all(|c| c.is_ascii_digit()) {
        return raw.parse::<f64>().ok().and_then(from_epoch_secs);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, OFFSET_FORMAT) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}
