//! online / offline classification of a single device
//!
//! the checks form a strict priority chain, the first rule that fires decides:
//! 1. `status` in the offline set
//! 2. `state` in the offline set
//! 3. `online == false`
//! 4. `is_online == false`
//! 5. last seen older than the idle threshold
//!
//! a device that trips none of them is online. an explicit `status=online` does not
//! short-circuit anything, it simply is not an offline signal.

use chrono::{DateTime, Duration, Utc};

use crate::entity::bo::liveness_bo::{LivenessReason, LivenessVerdict};
use crate::entity::dto::device_telemetry_dto::DeviceTelemetryDto;

const OFFLINE_VALUES: [&str; 3] = ["offline", "inactive", "disconnected"];

/// lower-cased value when it names an offline condition
fn offline_value(field: &Option<String>) -> Option<String> {
    let value = field.as_ref()?.to_lowercase();
    if OFFLINE_VALUES.contains(&value.as_str()) {
        Some(value)
    } else {
        None
    }
}

pub fn classify(telemetry: &DeviceTelemetryDto, idle_threshold_min: i64) -> LivenessVerdict {
    classify_at(telemetry, idle_threshold_min, Utc::now())
}

pub fn classify_at(telemetry: &DeviceTelemetryDto, idle_threshold_min: i64, now: DateTime<Utc>) -> LivenessVerdict {
    if let Some(status) = offline_value(&telemetry.status) {
        return LivenessVerdict::offline(LivenessReason::Status(status));
    }
    if let Some(state) = offline_value(&telemetry.state) {
        return LivenessVerdict::offline(LivenessReason::State(state));
    }
    if telemetry.online == Some(false) {
        return LivenessVerdict::offline(LivenessReason::OnlineFlagFalse);
    }
    if telemetry.is_online == Some(false) {
        return LivenessVerdict::offline(LivenessReason::IsOnlineFlagFalse);
    }
    if let Some(last_seen) = telemetry.last_seen_at() {
        let elapsed = now - last_seen;
        if elapsed > Duration::minutes(idle_threshold_min) {
            return LivenessVerdict::offline(LivenessReason::Idle {
                elapsed_min: elapsed.num_minutes(),
                threshold_min: idle_threshold_min,
            });
        }
    }
    LivenessVerdict::online()
}
