//! http api request/response bodies

use serde::{Deserialize, Serialize};

use crate::common::error::MonitorError;

#[derive(Debug, Clone, Deserialize)]
pub struct AddDeviceDto {
    pub dev_id: String,
}

impl AddDeviceDto {
    /// ids are kept as text; only plain id characters are accepted
    pub fn validated_id(&self) -> Result<String, MonitorError> {
        let dev_id = self.dev_id.trim();
        if dev_id.is_empty() {
            return Err(MonitorError::InvalidInput("dev_id is empty".to_string()));
        }
        if !dev_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(MonitorError::InvalidInput(format!("invalid dev_id: {}", dev_id)));
        }
        Ok(dev_id.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchedDevicesDto {
    pub devices: Vec<String>,
}
