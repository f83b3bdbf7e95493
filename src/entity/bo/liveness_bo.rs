//! 在线判定结果与状态变化类型

use std::fmt::{self, Display, Formatter};

use serde::Serialize;

/// why a device got its verdict, rendered as the tagged reason string stored in device_state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LivenessReason {
    Status(String),
    State(String),
    OnlineFlagFalse,
    IsOnlineFlagFalse,
    Idle { elapsed_min: i64, threshold_min: i64 },
    Online,
}

impl Display for LivenessReason {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            LivenessReason::Status(value) => write!(f, "status={}", value),
            LivenessReason::State(value) => write!(f, "state={}", value),
            LivenessReason::OnlineFlagFalse => write!(f, "online=false"),
            LivenessReason::IsOnlineFlagFalse => write!(f, "is_online=false"),
            LivenessReason::Idle { elapsed_min, threshold_min } => {
                write!(f, "last_seen {} min (> {} min)", elapsed_min, threshold_min)
            }
            LivenessReason::Online => write!(f, "online"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LivenessVerdict {
    pub offline: bool,
    pub reason: LivenessReason,
}

impl LivenessVerdict {
    pub fn offline(reason: LivenessReason) -> Self {
        LivenessVerdict { offline: true, reason }
    }

    pub fn online() -> Self {
        LivenessVerdict {
            offline: false,
            reason: LivenessReason::Online,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TransitionKind {
    FirstSeenOffline,
    FirstSeenOnline,
    BecameOffline,
    BecameOnline,
    Unchanged,
}
