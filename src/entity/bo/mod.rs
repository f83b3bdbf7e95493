//! 业务对象

pub mod liveness_bo;
pub mod monitor_config_bo;
