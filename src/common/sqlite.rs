use std::path::Path;
use tokio_rusqlite::Connection;

use super::error::MonitorError;
use crate::debug;

const TAG: &str = "sqlite";

/// sqlite 文件句柄，每次操作打开一个新的异步连接
#[derive(Debug, Clone)]
pub struct SqliteConnection {
    // sqlite 文件路径
    file_name: String,
}

impl SqliteConnection {
    /// create the parent folder of the db file when missing
    pub fn new(file_name: &str) -> Result<Self, MonitorError> {
        if let Some(parent) = Path::new(file_name).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    MonitorError::Internal(format!("create db folder {} error: {e}", parent.display()))
                })?;
                debug!(TAG, "db folder {} created", parent.display());
            }
        }
        Ok(SqliteConnection {
            file_name: file_name.to_string(),
        })
    }

    pub async fn open(&self) -> tokio_rusqlite::Result<Connection> {
        Connection::open(self.file_name.as_str()).await
    }
}
