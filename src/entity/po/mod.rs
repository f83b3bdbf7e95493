//! 数据库实体类

pub mod device_state_po;
