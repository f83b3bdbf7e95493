//! 比较本轮判定与上一轮保存的状态

use crate::entity::bo::liveness_bo::{LivenessVerdict, TransitionKind};
use crate::entity::po::device_state_po::DeviceStatePo;
use crate::trace;

const TAG: &str = "transition";

/// `previous` is the row loaded at the start of the cycle, None for a device never seen before
pub fn detect(device_id: &str, current: &LivenessVerdict, previous: Option<&DeviceStatePo>) -> TransitionKind {
    let kind = match previous {
        None if current.offline => TransitionKind::FirstSeenOffline,
        None => TransitionKind::FirstSeenOnline,
        Some(prev) if prev.offline && !current.offline => TransitionKind::BecameOnline,
        Some(prev) if !prev.offline && current.offline => TransitionKind::BecameOffline,
        Some(_) => TransitionKind::Unchanged,
    };
    trace!(TAG, "device {} -> {:?}", device_id, kind);
    kind
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::entity::bo::liveness_bo::LivenessReason;

    fn prev(offline: bool) -> DeviceStatePo {
        DeviceStatePo {
            dev_id: String::from("13900"),
            offline,
            last_reason: String::new(),
            name: String::from("Totem"),
            last_notified_at: None,
        }
    }

    fn offline() -> LivenessVerdict {
        LivenessVerdict::offline(LivenessReason::Status(String::from("offline")))
    }

    #[test]
    fn test_first_seen() {
        assert_eq!(detect("13900", &offline(), None), TransitionKind::FirstSeenOffline);
        assert_eq!(detect("13900", &LivenessVerdict::online(), None), TransitionKind::FirstSeenOnline);
    }

    #[test]
    fn test_changes() {
        assert_eq!(detect("13900", &LivenessVerdict::online(), Some(&prev(true))), TransitionKind::BecameOnline);
        assert_eq!(detect("13900", &offline(), Some(&prev(false))), TransitionKind::BecameOffline);
    }

    #[test]
    fn test_unchanged() {
        assert_eq!(detect("13900", &offline(), Some(&prev(true))), TransitionKind::Unchanged);
        assert_eq!(detect("13900", &LivenessVerdict::online(), Some(&prev(false))), TransitionKind::Unchanged);
    }
}
