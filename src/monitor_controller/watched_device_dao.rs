//! 监控设备列表 dao 对象
use async_trait::async_trait;
use rusqlite::params;
use std::sync::Arc;

use crate::common::dao::Dao;
use crate::common::error::MonitorError;
use crate::common::sqlite::SqliteConnection;
use crate::debug;

const TAG: &str = "WatchedDeviceDao";

pub struct WatchedDeviceDao {
    sqlite: Arc<SqliteConnection>,
    table_name: &'static str,
}

#[async_trait]
impl Dao for WatchedDeviceDao {
    fn sqlite(&self) -> &SqliteConnection {
        &self.sqlite
    }

    fn table_name(&self) -> &'static str {
        self.table_name
    }

    async fn create_table(&self) -> Result<(), MonitorError> {
        let conn = self.sqlite.open().await?;
        let table_name = self.table_name;

        conn.call(move |conn| {
            conn.execute(
                format!(
                    "CREATE TABLE IF NOT EXISTS {} (
                    id          INTEGER PRIMARY KEY autoincrement,
                    dev_id      TEXT NOT NULL UNIQUE
                )",
                    table_name
                )
                .as_str(),
                (),
            )
        })
        .await?;

        debug!(TAG, "watched device table init");
        Ok(())
    }
}

impl WatchedDeviceDao {
    pub fn new(sqlite: Arc<SqliteConnection>) -> Self {
        WatchedDeviceDao {
            sqlite,
            table_name: "watched_device",
        }
    }

    /// device ids in the order they were added
    pub async fn list(&self) -> Result<Vec<String>, MonitorError> {
        let conn = self.sqlite.open().await?;
        let table_name = self.table_name;

        let ids = conn
            .call(move |conn| {
                let mut stmt = conn.prepare(format!("SELECT dev_id FROM {} ORDER BY id", table_name).as_str())?;
                let ids = stmt
                    .query_map([], |row| row.get::<usize, String>(0))?
                    .collect::<Result<Vec<String>, rusqlite::Error>>()?;
                Ok(ids)
            })
            .await?;

        Ok(ids)
    }

    /// returns false when the device was already watched
    pub async fn add(&self, dev_id: &str) -> Result<bool, MonitorError> {
        let conn = self.sqlite.open().await?;
        let table_name = self.table_name;
        let dev_id = dev_id.to_string();

        let inserted = conn
            .call(move |conn| {
                conn.execute(
                    format!("INSERT OR IGNORE INTO {} (dev_id) VALUES (?1)", table_name).as_str(),
                    params![dev_id],
                )
            })
            .await?;

        Ok(inserted > 0)
    }

    /// returns false when the device was not watched
    pub async fn remove(&self, dev_id: &str) -> Result<bool, MonitorError> {
        let conn = self.sqlite.open().await?;
        let table_name = self.table_name;
        let dev_id = dev_id.to_string();

        let deleted = conn
            .call(move |conn| {
                conn.execute(
                    format!("DELETE FROM {} WHERE dev_id = ?1", table_name).as_str(),
                    params![dev_id],
                )
            })
            .await?;

        Ok(deleted > 0)
    }
}
