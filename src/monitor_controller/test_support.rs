//! in-memory telemetry source and mail sink for monitor tests

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::traits::{FetchScope, NotificationSink, TelemetrySource};
use super::watched_device_dao::WatchedDeviceDao;
use crate::common::error::MonitorError;
use crate::entity::dto::device_telemetry_dto::DeviceTelemetryDto;

#[derive(Default)]
pub struct FakeSource {
    records: Mutex<Vec<Value>>,
    scopes: Mutex<Vec<FetchScope>>,
    fail: AtomicBool,
    // 模拟拉取过程中有人把设备移出监控列表
    unwatch_on_fetch: Mutex<Option<(WatchedDeviceDao, String)>>,
}

impl FakeSource {
    pub fn set_records(&self, records: Vec<Value>) {
        *self.records.lock().unwrap() = records;
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn unwatch_on_next_fetch(&self, dao: WatchedDeviceDao, dev_id: &str) {
        *self.unwatch_on_fetch.lock().unwrap() = Some((dao, dev_id.to_string()));
    }

    pub fn scopes(&self) -> Vec<FetchScope> {
        self.scopes.lock().unwrap().clone()
    }
}

#[async_trait]
impl TelemetrySource for FakeSource {
    async fn fetch(&self, scope: &FetchScope) -> Result<Vec<DeviceTelemetryDto>, MonitorError> {
        self.scopes.lock().unwrap().push(scope.clone());
        let unwatch = self.unwatch_on_fetch.lock().unwrap().take();
        if let Some((dao, dev_id)) = unwatch {
            dao.remove(&dev_id).await?;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(MonitorError::Upstream(String::from("connection refused")));
        }
        let records = self.records.lock().unwrap();
        Ok(records.iter().filter_map(DeviceTelemetryDto::from_json).collect())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentMail {
    pub subject: String,
    pub html: String,
    pub recipients: Vec<String>,
}

#[derive(Default)]
pub struct FakeSink {
    sent: Mutex<Vec<SentMail>>,
    fail: AtomicBool,
    // 逐次指定结果，true 为发送成功，用完后回到 fail 开关
    outcomes: Mutex<VecDeque<bool>>,
}

impl FakeSink {
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn queue_outcomes(&self, outcomes: &[bool]) {
        self.outcomes.lock().unwrap().extend(outcomes.iter().copied());
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn subjects(&self) -> Vec<String> {
        self.sent().into_iter().map(|mail| mail.subject).collect()
    }
}

#[async_trait]
impl NotificationSink for FakeSink {
    async fn send(&self, subject: &str, html_body: &str, recipients: &[String]) -> Result<(), MonitorError> {
        let ok = match self.outcomes.lock().unwrap().pop_front() {
            Some(ok) => ok,
            None => !self.fail.load(Ordering::SeqCst),
        };
        if !ok {
            return Err(MonitorError::Mail(String::from("smtp refused")));
        }
        self.sent.lock().unwrap().push(SentMail {
            subject: subject.to_string(),
            html: html_body.to_string(),
            recipients: recipients.to_vec(),
        });
        Ok(())
    }
}
