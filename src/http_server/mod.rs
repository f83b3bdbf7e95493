//! http 管理接口
//! - /healthz 健康检查，不需要认证
//! - /api/* 设备列表、参数、状态查询，可选 basic auth

pub mod auth;
pub mod server;
