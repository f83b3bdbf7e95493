use serde::Serialize;

/// 数据库对象：设备最近一次的在线状态
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceStatePo {
    // 设备 id（数字 id、uuid 或序列号）
    pub dev_id: String,
    // 是否离线
    pub offline: bool,
    // 最近一次判定的原因
    pub last_reason: String,
    // 显示名称
    pub name: String,
    // 最近一次发送通知的时间（RFC 3339）
    pub last_notified_at: Option<String>,
}
