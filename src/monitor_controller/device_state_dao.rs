//! 设备状态 dao 对象，每个设备一行，只保存最近一次的判定
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::params;
use std::sync::Arc;

use crate::common::dao::Dao;
use crate::common::error::MonitorError;
use crate::common::sqlite::SqliteConnection;
use crate::debug;
use crate::entity::po::device_state_po::DeviceStatePo;

const TAG: &str = "DeviceStateDao";

pub struct DeviceStateDao {
    sqlite: Arc<SqliteConnection>,
    table_name: &'static str,
}

#[async_trait]
impl Dao for DeviceStateDao {
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
                    dev_id              TEXT PRIMARY KEY,
                    offline             INTEGER NOT NULL,
                    last_reason         TEXT NOT NULL,
                    name                TEXT NOT NULL,
                    last_notified_at    TEXT
                )",
                    table_name
                )
                .as_str(),
                (),
            )
        })
        .await?;

        debug!(TAG, "device state table init");
        Ok(())
    }
}

impl DeviceStateDao {
    pub fn new(sqlite: Arc<SqliteConnection>) -> Self {
        DeviceStateDao {
            sqlite,
            table_name: "device_state",
        }
    }

    /// all rows, ordered by id
    pub async fn get_all(&self) -> Result<Vec<DeviceStatePo>, MonitorError> {
        let conn = self.sqlite.open().await?;
        let table_name = self.table_name;

        let states = conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    format!(
                        "SELECT dev_id, offline, last_reason, name, last_notified_at FROM {} ORDER BY dev_id",
                        table_name
                    )
                    .as_str(),
                )?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok(DeviceStatePo {
                            dev_id: row.get(0)?,
                            offline: row.get(1)?,
                            last_reason: row.get(2)?,
                            name: row.get(3)?,
                            last_notified_at: row.get(4)?,
                        })
                    })?
                    .collect::<Result<Vec<DeviceStatePo>, rusqlite::Error>>()?;
                Ok(rows)
            })
            .await?;

        Ok(states)
    }

    /// upsert the verdict columns of every row in a single transaction, last_notified_at is left untouched
    pub async fn upsert_all(&self, states: Vec<DeviceStatePo>) -> Result<(), MonitorError> {
        if states.is_empty() {
            return Ok(());
        }
        let conn = self.sqlite.open().await?;
        let table_name = self.table_name;
        let count = states.len();

        conn.call(move |conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    format!(
                        "INSERT INTO {} (dev_id, offline, last_reason, name) VALUES (?1, ?2, ?3, ?4)
                        ON CONFLICT(dev_id) DO UPDATE SET
                            offline = excluded.offline,
                            last_reason = excluded.last_reason,
                            name = excluded.name",
                        table_name
                    )
                    .as_str(),
                )?;
                for state in states.iter() {
                    stmt.execute(params![state.dev_id, state.offline, state.last_reason, state.name])?;
                }
            }
            tx.commit()
        })
        .await?;

        debug!(TAG, "{} device states saved", count);
        Ok(())
    }

    /// stamp last_notified_at for the given devices
    pub async fn mark_notified(&self, dev_ids: Vec<String>, at: DateTime<Utc>) -> Result<(), MonitorError> {
        if dev_ids.is_empty() {
            return Ok(());
        }
        let conn = self.sqlite.open().await?;
        let table_name = self.table_name;
        let stamp = at.to_rfc3339_opts(SecondsFormat::Secs, true);

        conn.call(move |conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    format!("UPDATE {} SET last_notified_at = ?1 WHERE dev_id = ?2", table_name).as_str(),
                )?;
                for dev_id in dev_ids.iter() {
                    stmt.execute(params![stamp, dev_id])?;
                }
            }
            tx.commit()
        })
        .await?;

        Ok(())
    }

    pub async fn delete(&self, dev_id: &str) -> Result<(), MonitorError> {
        let conn = self.sqlite.open().await?;
        let table_name = self.table_name;
        let dev_id = dev_id.to_string();

        conn.call(move |conn| {
            conn.execute(
                format!("DELETE FROM {} WHERE dev_id = ?1", table_name).as_str(),
                params![dev_id],
            )
        })
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    async fn setup() -> (TempDir, DeviceStateDao) {
        let dir = tempfile::tempdir().unwrap();
        let sqlite = SqliteConnection::new(dir.path().join("state.db").to_str().unwrap()).unwrap();
        let dao = DeviceStateDao::new(Arc::new(sqlite));
        dao.ensure_table_exist().await.unwrap();
        (dir, dao)
    }

    fn state(dev_id: &str, offline: bool, reason: &str) -> DeviceStatePo {
        DeviceStatePo {
            dev_id: dev_id.to_string(),
            offline,
            last_reason: reason.to_string(),
            name: format!("Device {}", dev_id),
            last_notified_at: None,
        }
    }

    #[tokio::test]
    async fn test_table_lifecycle() {
        let (_dir, dao) = setup().await;
        assert!(dao.check_table().await.unwrap());
        dao.drop_table().await.unwrap();
        assert!(!dao.check_table().await.unwrap());
        dao.ensure_table_exist().await.unwrap();
        assert!(dao.check_table().await.unwrap());
    }

    #[tokio::test]
    async fn test_upsert_keeps_single_row_per_device() {
        let (_dir, dao) = setup().await;
        dao.upsert_all(vec![state("1", false, "online"), state("2", true, "status=offline")])
            .await
            .unwrap();
        dao.upsert_all(vec![state("1", true, "online=false")]).await.unwrap();

        let states = dao.get_all().await.unwrap();
        assert_eq!(states.len(), 2);
        assert_eq!(states[0].dev_id, "1");
        assert!(states[0].offline);
        assert_eq!(states[0].last_reason, "online=false");
        assert_eq!(states[1].dev_id, "2");
    }

    #[tokio::test]
    async fn test_upsert_preserves_last_notified_at() {
        let (_dir, dao) = setup().await;
        dao.upsert_all(vec![state("1", true, "status=offline")]).await.unwrap();
        let at = Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0).unwrap();
        dao.mark_notified(vec!["1".to_string()], at).await.unwrap();

        dao.upsert_all(vec![state("1", false, "online")]).await.unwrap();

        let states = dao.get_all().await.unwrap();
        assert_eq!(states[0].last_notified_at.as_deref(), Some("2025-09-01T12:00:00Z"));
        assert!(!states[0].offline);
    }

    #[tokio::test]
    async fn test_delete() {
        let (_dir, dao) = setup().await;
        dao.upsert_all(vec![state("1", false, "online"), state("2", false, "online")])
            .await
            .unwrap();
        dao.delete("1").await.unwrap();
        let states = dao.get_all().await.unwrap();
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].dev_id, "2");
    }
}
