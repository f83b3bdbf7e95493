//! 设备在线监控模块
//! - 定期拉取远程设备遥测，判定在线 / 离线
//! - 与上一轮状态对比，发现状态变化
//! - 按冷却期发送离线与恢复通知邮件
//! - 维护监控设备列表与运行参数

pub mod classifier;
pub mod device_state_dao;
pub mod monitor_manager;
pub mod notification;
pub mod notify_gate;
pub mod setting_dao;
pub mod traits;
pub mod transition;
pub mod watched_device_dao;
pub mod workers;

#[cfg(test)]
pub mod test_support;
