//! 通知邮件内容：标题、设备列表、发送时间
//! every device field goes through the html auto-escaper of the template engine

use chrono::{DateTime, Utc};
use minijinja::{context, Environment};
use serde::Serialize;

use crate::common::error::MonitorError;
use crate::entity::bo::liveness_bo::LivenessVerdict;
use crate::entity::dto::device_telemetry_dto::DeviceTelemetryDto;
use crate::entity::dto::tick_report_dto::BatchKind;

// 文件名以 .html 结尾时 minijinja 自动开启 html 转义
const BATCH_TEMPLATE_NAME: &str = "batch.html";
const BATCH_TEMPLATE: &str = r#"<html><body style="font-family:Arial,Helvetica,sans-serif;line-height:1.5;color:#111">
  <h2 style="margin:0 0 8px 0">{{ title }}</h2>
  <ul>
  {%- for device in devices %}
    {%- if recovered %}
    <li><b>{{ device.name }}</b> (ID: <code>{{ device.dev_id }}</code>, location: {{ device.location }}) is back <b>ONLINE</b></li>
    {%- else %}
    <li><b>{{ device.name }}</b> (ID: <code>{{ device.dev_id }}</code>, location: {{ device.location }}) is <b>OFFLINE</b>, reason: {{ device.reason }}, last seen: {{ device.last_seen }}</li>
    {%- endif %}
  {%- endfor %}
  </ul>
  <p style="color:#666;font-size:12px">Sent {{ sent_at }}</p>
</body></html>
"#;

const SENT_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// one line of a notification mail
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationEntry {
    pub dev_id: String,
    pub name: String,
    pub location: String,
    pub reason: String,
    pub last_seen: String,
}

impl NotificationEntry {
    pub fn offline(dev_id: &str, telemetry: &DeviceTelemetryDto, verdict: &LivenessVerdict) -> Self {
        NotificationEntry {
            dev_id: dev_id.to_string(),
            name: telemetry.display_name(),
            location: telemetry.display_location().to_string(),
            reason: verdict.reason.to_string(),
            last_seen: telemetry.display_last_seen(),
        }
    }

    pub fn recovered(dev_id: &str, telemetry: &DeviceTelemetryDto) -> Self {
        NotificationEntry {
            dev_id: dev_id.to_string(),
            name: telemetry.display_name(),
            location: telemetry.display_location().to_string(),
            reason: LivenessVerdict::online().reason.to_string(),
            last_seen: telemetry.display_last_seen(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NotificationBatch {
    pub kind: BatchKind,
    pub entries: Vec<NotificationEntry>,
}

impl NotificationBatch {
    pub fn new(kind: BatchKind, entries: Vec<NotificationEntry>) -> Self {
        NotificationBatch { kind, entries }
    }

    pub fn dev_ids(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.dev_id.clone()).collect()
    }

    pub fn subject(&self, prefix: &str) -> String {
        let label = match self.kind {
            BatchKind::InitialOffline => "initial OFFLINE",
            BatchKind::Offline => "OFFLINE",
            BatchKind::Recovered => "ONLINE",
        };
        format!("{} {}: {} device(s)", prefix, label, self.entries.len())
    }

    fn title(&self) -> &'static str {
        match self.kind {
            BatchKind::InitialOffline => "⚠️ DISPL: OFFLINE devices detected (start-up)",
            BatchKind::Offline => "⚠️ DISPL: OFFLINE devices detected",
            BatchKind::Recovered => "✅ DISPL: devices recovered",
        }
    }

    pub fn render_html(&self, sent_at: DateTime<Utc>) -> Result<String, MonitorError> {
        let mut env = Environment::new();
        env.add_template(BATCH_TEMPLATE_NAME, BATCH_TEMPLATE)?;
        let template = env.get_template(BATCH_TEMPLATE_NAME)?;
        let html = template.render(context! {
            title => self.title(),
            recovered => self.kind == BatchKind::Recovered,
            devices => &self.entries,
            sent_at => sent_at.format(SENT_AT_FORMAT).to_string(),
        })?;
        Ok(html)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::entity::bo::liveness_bo::LivenessReason;
    use chrono::TimeZone;

    fn telemetry(id: &str, name: &str) -> DeviceTelemetryDto {
        let mut dto = DeviceTelemetryDto::new(id);
        dto.name = Some(name.to_string());
        dto
    }

    fn sent_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_subjects() {
        let entry = NotificationEntry::recovered("1", &telemetry("1", "Totem"));
        let batch = NotificationBatch::new(BatchKind::InitialOffline, vec![entry.clone(), entry.clone()]);
        assert_eq!(batch.subject("[DISPL]"), "[DISPL] initial OFFLINE: 2 device(s)");
        let batch = NotificationBatch::new(BatchKind::Offline, vec![entry.clone()]);
        assert_eq!(batch.subject("[DISPL]"), "[DISPL] OFFLINE: 1 device(s)");
        let batch = NotificationBatch::new(BatchKind::Recovered, vec![entry]);
        assert_eq!(batch.subject("[X]"), "[X] ONLINE: 1 device(s)");
    }

    #[test]
    fn test_offline_body() {
        let dto = telemetry("13900", "Totem Lobby");
        let verdict = LivenessVerdict::offline(LivenessReason::Idle { elapsed_min: 25, threshold_min: 10 });
        let batch = NotificationBatch::new(BatchKind::Offline, vec![NotificationEntry::offline("13900", &dto, &verdict)]);
        let html = batch.render_html(sent_at()).unwrap();

        assert!(html.contains("OFFLINE devices detected"));
        assert!(html.contains("<b>Totem Lobby</b>"));
        assert!(html.contains("<code>13900</code>"));
        assert!(html.contains("location: —"));
        assert!(html.contains("last_seen 25 min (&gt; 10 min)"));
        assert!(html.contains("last seen: N"));
        assert!(html.contains("Sent 2025-09-01 12:00:00 UTC"));
        assert_eq!(html.matches("<li>").count(), 1);
    }

    #[test]
    fn test_recovery_body() {
        let mut dto = telemetry("7", "Kiosk");
        dto.location = Some("Hall B".to_string());
        let batch = NotificationBatch::new(BatchKind::Recovered, vec![NotificationEntry::recovered("7", &dto)]);
        let html = batch.render_html(sent_at()).unwrap();
        assert!(html.contains("devices recovered"));
        assert!(html.contains("location: Hall B) is back <b>ONLINE</b>"));
        assert!(!html.contains("reason:"));
    }

    #[test]
    fn test_device_fields_are_escaped() {
        let dto = telemetry("1", "<b>Lobby & Bar</b>");
        let batch = NotificationBatch::new(BatchKind::Recovered, vec![NotificationEntry::recovered("1", &dto)]);
        let html = batch.render_html(sent_at()).unwrap();
        assert!(html.contains("&lt;b&gt;Lobby &amp; Bar"));
        assert!(!html.contains("<b>Lobby"));
    }

    #[test]
    fn test_dev_ids() {
        let batch = NotificationBatch::new(
            BatchKind::Offline,
            vec![
                NotificationEntry::recovered("a", &telemetry("a", "A")),
                NotificationEntry::recovered("b", &telemetry("b", "B")),
            ],
        );
        assert_eq!(batch.dev_ids(), vec!["a", "b"]);
    }
}
