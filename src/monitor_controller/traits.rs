use async_trait::async_trait;

use crate::common::error::MonitorError;
use crate::entity::dto::device_telemetry_dto::DeviceTelemetryDto;

/// which devices to ask the telemetry source for
#[derive(Debug, Clone, PartialEq)]
pub enum FetchScope {
    /// empty watch list, take everything the source offers
    All,
    Only(Vec<String>),
}

impl FetchScope {
    pub fn from_watched(ids: Vec<String>) -> Self {
        if ids.is_empty() {
            FetchScope::All
        } else {
            FetchScope::Only(ids)
        }
    }
}

/// remote device api, one call per cycle
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    async fn fetch(&self, scope: &FetchScope) -> Result<Vec<DeviceTelemetryDto>, MonitorError>;
}

/// outbound mail, best effort
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, subject: &str, html_body: &str, recipients: &[String]) -> Result<(), MonitorError>;
}
