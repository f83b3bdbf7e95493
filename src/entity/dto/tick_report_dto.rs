use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entity::bo::liveness_bo::TransitionKind;

/// the three mail batches a cycle can send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchKind {
    InitialOffline,
    Offline,
    Recovered,
}

/// summary of one polling cycle, kept in memory for the http api
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickReportDto {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub devices_checked: usize,
    pub first_seen_offline: usize,
    pub first_seen_online: usize,
    pub became_offline: usize,
    pub became_online: usize,
    pub dispatched: Vec<BatchKind>,
    pub failed: Vec<BatchKind>,
    /// problems that did not stop the cycle, e.g. a failed last_notified_at update
    pub warnings: Vec<String>,
    /// cycle level error, the cycle was aborted when set
    pub error: Option<String>,
}

impl TickReportDto {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        TickReportDto {
            started_at,
            finished_at: None,
            devices_checked: 0,
            first_seen_offline: 0,
            first_seen_online: 0,
            became_offline: 0,
            became_online: 0,
            dispatched: Vec::new(),
            failed: Vec::new(),
            warnings: Vec::new(),
            error: None,
        }
    }

    pub fn count(&mut self, kind: TransitionKind) {
        match kind {
            TransitionKind::FirstSeenOffline => self.first_seen_offline += 1,
            TransitionKind::FirstSeenOnline => self.first_seen_online += 1,
            TransitionKind::BecameOffline => self.became_offline += 1,
            TransitionKind::BecameOnline => self.became_online += 1,
            TransitionKind::Unchanged => {}
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_count_and_serialize() {
        let mut report = TickReportDto::new(Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0).unwrap());
        report.count(TransitionKind::FirstSeenOffline);
        report.count(TransitionKind::BecameOnline);
        report.count(TransitionKind::Unchanged);
        report.dispatched.push(BatchKind::InitialOffline);
        assert_eq!(report.first_seen_offline, 1);
        assert_eq!(report.became_online, 1);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["dispatched"][0], "initial_offline");
        assert_eq!(json["started_at"], "2025-09-01T12:00:00Z");
        assert!(json["error"].is_null());
    }
}
