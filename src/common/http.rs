//! networking module
//! function:
//! - 请求远程设备 api，返回设备遥测列表
//! - 远程返回非 2xx 状态码时返回 Upstream 错误
//! - 兼容 {"payload": [...]} 和直接返回数组两种格式

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use super::error::MonitorError;
use super::setting::Upstream;
use crate::entity::dto::device_telemetry_dto::DeviceTelemetryDto;
use crate::monitor_controller::traits::{FetchScope, TelemetrySource};
use crate::{debug, warn};

const LOG_TAG: &str = "Http-common-module";

pub struct UpstreamClient {
    client: reqwest::Client,
    devices_url: String,
    api_token: Option<String>,
}

impl UpstreamClient {
    pub fn new(config: &Upstream) -> Result<Self, MonitorError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(UpstreamClient {
            client,
            devices_url: format!("{}{}", config.base_url.trim_end_matches('/'), config.devices_path),
            api_token: config.api_token.clone().filter(|token| !token.is_empty()),
        })
    }

    /// wrapper for the device list api
    async fn api_get_devices(&self, scope: &FetchScope) -> Result<Value, MonitorError> {
        let mut request = self.client.get(self.devices_url.as_str());
        if let FetchScope::Only(ids) = scope {
            request = request.query(&[("ids", ids.join(","))]);
        }
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(MonitorError::Upstream(format!("GET {} returned {}", self.devices_url, status)));
        }
        Ok(resp.json::<Value>().await?)
    }
}

/// 取出设备数组，其余格式视为错误
fn get_device_list(resp: Value) -> Result<Vec<Value>, MonitorError> {
    match resp {
        Value::Array(list) => Ok(list),
        Value::Object(mut obj) => match obj.remove("payload") {
            Some(Value::Array(list)) => Ok(list),
            _ => Err(MonitorError::Upstream(String::from("response has no payload array"))),
        },
        other => Err(MonitorError::Upstream(format!("unexpected response: {}", other))),
    }
}

#[async_trait]
impl TelemetrySource for UpstreamClient {
    async fn fetch(&self, scope: &FetchScope) -> Result<Vec<DeviceTelemetryDto>, MonitorError> {
        let list = get_device_list(self.api_get_devices(scope).await?)?;
        let total = list.len();

        let mut devices = Vec::with_capacity(total);
        for record in list.iter() {
            let Some(dto) = DeviceTelemetryDto::from_json(record) else {
                warn!(LOG_TAG, "device record is not an object, skipped: {}", record);
                continue;
            };
            // 远程可能忽略 ids 参数，本地再过滤一次
            if let FetchScope::Only(ids) = scope {
                if !ids.contains(&dto.device_id) {
                    continue;
                }
            }
            devices.push(dto);
        }
        debug!(LOG_TAG, "{} of {} device records kept", devices.len(), total);
        Ok(devices)
    }
}
