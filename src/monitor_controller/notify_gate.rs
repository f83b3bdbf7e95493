//! 离线通知冷却期判断，同一设备在冷却期内不重复通知

use chrono::{DateTime, Duration, Utc};

use crate::util::time::parse_timestamp;
use crate::warn;

const TAG: &str = "notify_gate";

/// true when the device has never been notified, the stored stamp is garbage,
/// or at least `cooldown_min` minutes passed since the last notification
pub fn may_notify(device_id: &str, last_notified_at: Option<&str>, cooldown_min: i64, now: DateTime<Utc>) -> bool {
    let Some(stamp) = last_notified_at else {
        return true;
    };
    match parse_timestamp(stamp) {
        Some(last) => Duration::try_minutes(cooldown_min).map_or(false, |cooldown| now - last >= cooldown),
        None => {
            warn!(TAG, "device {} has unreadable last_notified_at {:?}, ignoring it", device_id, stamp);
            true
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_never_notified() {
        assert!(may_notify("1", None, 10, now()));
    }

    #[test]
    fn test_cooldown_window() {
        assert!(!may_notify("1", Some("2025-09-01T11:51:00Z"), 10, now()));
        assert!(may_notify("1", Some("2025-09-01T11:49:00Z"), 10, now()));
        // exactly on the boundary is allowed
        assert!(may_notify("1", Some("2025-09-01T11:50:00Z"), 10, now()));
    }

    #[test]
    fn test_unparseable_stamp_allows() {
        assert!(may_notify("1", Some("yesterday"), 10, now()));
        assert!(may_notify("1", Some(""), 10, now()));
    }
}
