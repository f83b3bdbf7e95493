//! 运行时参数，每个轮询周期开始时从 setting 表重新读取

use serde::{Deserialize, Serialize};

use crate::common::error::MonitorError;

pub const MIN_IDLE_THRESHOLD_MIN: i64 = 1;
pub const MIN_INTERVAL_SEC: i64 = 5;
// one year / one day, keeps duration arithmetic far away from overflow
pub const MAX_IDLE_THRESHOLD_MIN: i64 = 525_600;
pub const MAX_INTERVAL_SEC: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfigBo {
    /// minutes without last_seen update before a device counts as offline
    pub idle_threshold_min: i64,
    /// polling interval
    pub interval_sec: i64,
    /// notify devices that are already offline the first time they are seen
    pub notify_first: bool,
    /// do not send "back online" mails
    pub no_recovery: bool,
}

fn check_range(key: &str, value: i64, min: i64, max: i64) -> Result<(), MonitorError> {
    if value < min || value > max {
        return Err(MonitorError::InvalidSetting {
            key: key.to_string(),
            value: value.to_string(),
            msg: format!("must be between {} and {}", min, max),
        });
    }
    Ok(())
}

impl MonitorConfigBo {
    pub fn validate(&self) -> Result<(), MonitorError> {
        check_range("idle_threshold_min", self.idle_threshold_min, MIN_IDLE_THRESHOLD_MIN, MAX_IDLE_THRESHOLD_MIN)?;
        check_range("interval_sec", self.interval_sec, MIN_INTERVAL_SEC, MAX_INTERVAL_SEC)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn config() -> MonitorConfigBo {
        MonitorConfigBo {
            idle_threshold_min: 10,
            interval_sec: 10,
            notify_first: true,
            no_recovery: false,
        }
    }

    #[test]
    fn test_validate_bounds() {
        assert!(config().validate().is_ok());
        let lower_bound = MonitorConfigBo { idle_threshold_min: 1, interval_sec: 5, ..config() };
        assert!(lower_bound.validate().is_ok());

        let idle = MonitorConfigBo { idle_threshold_min: 0, ..config() };
        assert!(matches!(idle.validate(), Err(MonitorError::InvalidSetting { key, .. }) if key == "idle_threshold_min"));

        let interval = MonitorConfigBo { interval_sec: 4, ..config() };
        assert!(matches!(interval.validate(), Err(MonitorError::InvalidSetting { key, .. }) if key == "interval_sec"));

        let huge = MonitorConfigBo { idle_threshold_min: i64::MAX, ..config() };
        assert!(huge.validate().is_err());
    }
}
