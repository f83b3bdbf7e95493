//! 监控管理器
//! - 每个周期：拉取遥测 -> 判定 -> 对比上一轮状态 -> 保存 -> 组装通知 -> 发送
//! - 维护监控设备列表与运行参数
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use super::classifier::classify_at;
use super::device_state_dao::DeviceStateDao;
use super::notification::{NotificationBatch, NotificationEntry};
use super::notify_gate::may_notify;
use super::setting_dao::SettingDao;
use super::traits::{FetchScope, NotificationSink, TelemetrySource};
use super::transition::detect;
use super::watched_device_dao::WatchedDeviceDao;
use crate::common::dao::Dao;
use crate::common::error::MonitorError;
use crate::common::sqlite::SqliteConnection;
use crate::entity::bo::liveness_bo::TransitionKind;
use crate::entity::bo::monitor_config_bo::MonitorConfigBo;
use crate::entity::dto::tick_report_dto::{BatchKind, TickReportDto};
use crate::entity::po::device_state_po::DeviceStatePo;
use crate::{debug, error, info, warn};

const TAG: &str = "MonitorManager";

/// static mail options, only changed by a restart
#[derive(Debug, Clone)]
pub struct NotifyOptions {
    pub recipients: Vec<String>,
    pub subject_prefix: String,
    pub cooldown_min: i64,
}

/// offline candidate waiting for the cooldown check
struct Candidate {
    entry: NotificationEntry,
    last_notified_at: Option<String>,
}

pub struct MonitorManager {
    watched_device_dao: WatchedDeviceDao,
    setting_dao: SettingDao,
    device_state_dao: DeviceStateDao,
    source: Arc<dyn TelemetrySource>,
    sink: Arc<dyn NotificationSink>,
    options: NotifyOptions,
    // 最近一次周期的结果，给 http 接口使用
    last_report: Mutex<Option<TickReportDto>>,
}

impl MonitorManager {
    pub fn new(
        sqlite: Arc<SqliteConnection>,
        defaults: MonitorConfigBo,
        source: Arc<dyn TelemetrySource>,
        sink: Arc<dyn NotificationSink>,
        options: NotifyOptions,
    ) -> Self {
        MonitorManager {
            watched_device_dao: WatchedDeviceDao::new(sqlite.clone()),
            setting_dao: SettingDao::new(sqlite.clone(), defaults),
            device_state_dao: DeviceStateDao::new(sqlite),
            source,
            sink,
            options,
            last_report: Mutex::new(None),
        }
    }

    /// 系统初始化：建表并写入默认参数
    pub async fn init(&self) -> Result<(), MonitorError> {
        self.watched_device_dao.ensure_table_exist().await?;
        self.setting_dao.ensure_table_exist().await?;
        self.device_state_dao.ensure_table_exist().await?;
        self.setting_dao.seed_defaults().await?;
        info!(TAG, "monitor tables ready");
        Ok(())
    }

    /// run one polling cycle, a cycle level error ends up in `report.error`
    pub async fn run_tick(&self, now: DateTime<Utc>) -> TickReportDto {
        let mut report = TickReportDto::new(now);
        if let Err(e) = self.tick(now, &mut report).await {
            error!(TAG, "monitor cycle aborted: {}", e);
            report.error = Some(e.to_string());
        }
        report.finished_at = Some(Utc::now());
        info!(
            TAG,
            "cycle done, checked: {}, dispatched: {:?}, failed: {:?}",
            report.devices_checked,
            report.dispatched,
            report.failed
        );

        let mut guard = self.last_report.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(report.clone());
        report
    }

    async fn tick(&self, now: DateTime<Utc>, report: &mut TickReportDto) -> Result<(), MonitorError> {
        // 1. 读取参数和监控列表
        let config = self.setting_dao.load_config().await?;
        let scope = FetchScope::from_watched(self.watched_device_dao.list().await?);

        // 2. 拉取遥测
        let telemetry = self.source.fetch(&scope).await?;
        debug!(TAG, "{} telemetry records fetched, scope: {:?}", telemetry.len(), scope);
        let unwatched = self.unwatched_since(&scope).await?;

        // 3. 上一轮状态，只读一次
        let previous: HashMap<String, DeviceStatePo> = self
            .device_state_dao
            .get_all()
            .await?
            .into_iter()
            .map(|state| (state.dev_id.clone(), state))
            .collect();

        // 4. 判定并记录变化
        let mut seen: HashSet<String> = HashSet::new();
        let mut staged: Vec<DeviceStatePo> = Vec::new();
        let mut initial_offline: Vec<Candidate> = Vec::new();
        let mut new_offline: Vec<Candidate> = Vec::new();
        let mut recovered: Vec<NotificationEntry> = Vec::new();

        for record in telemetry.iter() {
            let dev_id = record.device_id.clone();
            if !seen.insert(dev_id.clone()) {
                warn!(TAG, "device {} appears more than once in the response, skipped", dev_id);
                continue;
            }
            if unwatched.contains(&dev_id) {
                info!(TAG, "device {} left the watch list during the cycle, skipped", dev_id);
                continue;
            }

            let verdict = classify_at(record, config.idle_threshold_min, now);
            let prev = previous.get(&dev_id);
            let kind = detect(&dev_id, &verdict, prev);
            report.count(kind);
            debug!(
                TAG,
                "{} (ID {}) -> {} ({}), prev: {:?}",
                record.display_name(),
                dev_id,
                if verdict.offline { "OFFLINE" } else { "ONLINE" },
                verdict.reason,
                prev.map(|p| p.offline)
            );

            let last_notified_at = prev.and_then(|p| p.last_notified_at.clone());
            match kind {
                TransitionKind::FirstSeenOffline => initial_offline.push(Candidate {
                    entry: NotificationEntry::offline(&dev_id, record, &verdict),
                    last_notified_at: last_notified_at.clone(),
                }),
                TransitionKind::BecameOffline => new_offline.push(Candidate {
                    entry: NotificationEntry::offline(&dev_id, record, &verdict),
                    last_notified_at: last_notified_at.clone(),
                }),
                TransitionKind::BecameOnline => recovered.push(NotificationEntry::recovered(&dev_id, record)),
                TransitionKind::FirstSeenOnline | TransitionKind::Unchanged => {}
            }

            staged.push(DeviceStatePo {
                dev_id,
                offline: verdict.offline,
                last_reason: verdict.reason.to_string(),
                name: record.display_name(),
                last_notified_at,
            });
        }
        report.devices_checked = staged.len();

        // 5. 一个事务内保存全部状态
        self.device_state_dao.upsert_all(staged).await?;

        // 6. 组装并发送通知
        for batch in self.assemble_batches(&config, initial_offline, new_offline, recovered, now) {
            self.dispatch(batch, now, report).await;
        }
        Ok(())
    }

    /// ids of the fetch scope that were removed from the watch list while fetching
    async fn unwatched_since(&self, scope: &FetchScope) -> Result<HashSet<String>, MonitorError> {
        let FetchScope::Only(ids) = scope else {
            return Ok(HashSet::new());
        };
        let current: HashSet<String> = self.watched_device_dao.list().await?.into_iter().collect();
        Ok(ids.iter().filter(|id| !current.contains(*id)).cloned().collect())
    }

    fn assemble_batches(
        &self,
        config: &MonitorConfigBo,
        initial_offline: Vec<Candidate>,
        new_offline: Vec<Candidate>,
        recovered: Vec<NotificationEntry>,
        now: DateTime<Utc>,
    ) -> Vec<NotificationBatch> {
        let mut batches = Vec::new();

        if config.notify_first {
            let entries = self.gate(initial_offline, now);
            if !entries.is_empty() {
                batches.push(NotificationBatch::new(BatchKind::InitialOffline, entries));
            }
        } else if !initial_offline.is_empty() {
            debug!(TAG, "{} devices offline on first sight, notify_first is off", initial_offline.len());
        }

        let entries = self.gate(new_offline, now);
        if !entries.is_empty() {
            batches.push(NotificationBatch::new(BatchKind::Offline, entries));
        }

        if !config.no_recovery && !recovered.is_empty() {
            batches.push(NotificationBatch::new(BatchKind::Recovered, recovered));
        }
        batches
    }

    /// drop candidates that are still inside the cooldown window
    fn gate(&self, candidates: Vec<Candidate>, now: DateTime<Utc>) -> Vec<NotificationEntry> {
        candidates
            .into_iter()
            .filter(|candidate| {
                let allowed = may_notify(
                    &candidate.entry.dev_id,
                    candidate.last_notified_at.as_deref(),
                    self.options.cooldown_min,
                    now,
                );
                if !allowed {
                    debug!(TAG, "device {} still in cooldown, not notified", candidate.entry.dev_id);
                }
                allowed
            })
            .map(|candidate| candidate.entry)
            .collect()
    }

    async fn dispatch(&self, batch: NotificationBatch, now: DateTime<Utc>, report: &mut TickReportDto) {
        let subject = batch.subject(&self.options.subject_prefix);
        let sent = match batch.render_html(now) {
            Ok(html) => self.sink.send(&subject, &html, &self.options.recipients).await,
            Err(e) => Err(e),
        };
        if let Err(e) = sent {
            error!(TAG, "mail \"{}\" not sent: {}", subject, e);
            report.failed.push(batch.kind);
            return;
        }
        info!(TAG, "mail \"{}\" sent to {:?}", subject, self.options.recipients);
        report.dispatched.push(batch.kind);

        // 恢复通知不影响冷却期
        if batch.kind == BatchKind::Recovered {
            return;
        }
        if let Err(e) = self.device_state_dao.mark_notified(batch.dev_ids(), now).await {
            error!(TAG, "mail \"{}\" sent but last_notified_at not saved: {}", subject, e);
            report.warnings.push(format!("record last_notified_at for {:?}: {}", batch.kind, e));
        }
    }

    pub fn last_report(&self) -> Option<TickReportDto> {
        self.last_report.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub async fn load_config(&self) -> Result<MonitorConfigBo, MonitorError> {
        self.setting_dao.load_config().await
    }

    pub async fn save_config(&self, config: &MonitorConfigBo) -> Result<(), MonitorError> {
        self.setting_dao.save_config(config).await
    }

    pub async fn list_devices(&self) -> Result<Vec<String>, MonitorError> {
        self.watched_device_dao.list().await
    }

    /// returns false when the device was already watched
    pub async fn add_device(&self, dev_id: &str) -> Result<bool, MonitorError> {
        let added = self.watched_device_dao.add(dev_id).await?;
        if added {
            info!(TAG, "device {} added to watch list", dev_id);
        }
        Ok(added)
    }

    /// removes the device from the watch list together with its saved state
    pub async fn remove_device(&self, dev_id: &str) -> Result<bool, MonitorError> {
        let removed = self.watched_device_dao.remove(dev_id).await?;
        self.device_state_dao.delete(dev_id).await?;
        info!(TAG, "device {} removed, was watched: {}", dev_id, removed);
        Ok(removed)
    }

    pub async fn list_states(&self) -> Result<Vec<DeviceStatePo>, MonitorError> {
        self.device_state_dao.get_all().await
    }
}
