//! 运行参数 dao 对象，key-value 形式保存，读取时转换为 MonitorConfigBo
use async_trait::async_trait;
use rusqlite::params;
use std::collections::HashMap;
use std::sync::Arc;

use crate::common::dao::Dao;
use crate::common::error::MonitorError;
use crate::common::sqlite::SqliteConnection;
use crate::entity::bo::monitor_config_bo::MonitorConfigBo;
use crate::{debug, info};

const TAG: &str = "SettingDao";

const KEY_IDLE_THRESHOLD: &str = "idle_threshold_min";
const KEY_INTERVAL: &str = "interval_sec";
const KEY_NOTIFY_FIRST: &str = "notify_first";
const KEY_NO_RECOVERY: &str = "no_recovery";

pub struct SettingDao {
    sqlite: Arc<SqliteConnection>,
    table_name: &'static str,
    // 表中缺少某个 key 时使用的值
    defaults: MonitorConfigBo,
}

#[async_trait]
impl Dao for SettingDao {
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
                    key     TEXT PRIMARY KEY,
                    value   TEXT NOT NULL
                )",
                    table_name
                )
                .as_str(),
                (),
            )
        })
        .await?;

        debug!(TAG, "setting table init");
        Ok(())
    }
}

fn to_pairs(config: &MonitorConfigBo) -> Vec<(&'static str, String)> {
    vec![
        (KEY_IDLE_THRESHOLD, config.idle_threshold_min.to_string()),
        (KEY_INTERVAL, config.interval_sec.to_string()),
        (KEY_NOTIFY_FIRST, bool_to_text(config.notify_first)),
        (KEY_NO_RECOVERY, bool_to_text(config.no_recovery)),
    ]
}

fn bool_to_text(value: bool) -> String {
    String::from(if value { "1" } else { "0" })
}

fn parse_int(key: &str, value: &str) -> Result<i64, MonitorError> {
    value.trim().parse::<i64>().map_err(|e| MonitorError::InvalidSetting {
        key: key.to_string(),
        value: value.to_string(),
        msg: format!("not an integer: {e}"),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, MonitorError> {
    match value.trim() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(MonitorError::InvalidSetting {
            key: key.to_string(),
            value: value.to_string(),
            msg: String::from("expected 1 or 0"),
        }),
    }
}

impl SettingDao {
    pub fn new(sqlite: Arc<SqliteConnection>, defaults: MonitorConfigBo) -> Self {
        SettingDao {
            sqlite,
            table_name: "setting",
            defaults,
        }
    }

    /// write default values for keys that are not in the table yet
    pub async fn seed_defaults(&self) -> Result<(), MonitorError> {
        self.defaults.validate()?;
        let conn = self.sqlite.open().await?;
        let table_name = self.table_name;
        let pairs = to_pairs(&self.defaults);

        conn.call(move |conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt =
                    tx.prepare(format!("INSERT OR IGNORE INTO {} (key, value) VALUES (?1, ?2)", table_name).as_str())?;
                for (key, value) in pairs.iter() {
                    stmt.execute(params![key, value])?;
                }
            }
            tx.commit()
        })
        .await?;

        info!(TAG, "default settings seeded: {:?}", self.defaults);
        Ok(())
    }

    async fn read_raw(&self) -> Result<HashMap<String, String>, MonitorError> {
        let conn = self.sqlite.open().await?;
        let table_name = self.table_name;

        let raw = conn
            .call(move |conn| {
                let mut stmt = conn.prepare(format!("SELECT key, value FROM {}", table_name).as_str())?;
                let pairs = stmt
                    .query_map([], |row| Ok((row.get::<usize, String>(0)?, row.get::<usize, String>(1)?)))?
                    .collect::<Result<HashMap<String, String>, rusqlite::Error>>()?;
                Ok(pairs)
            })
            .await?;

        Ok(raw)
    }

    /// typed snapshot of the settings, rejects values that do not parse or are out of range
    pub async fn load_config(&self) -> Result<MonitorConfigBo, MonitorError> {
        let raw = self.read_raw().await?;

        let config = MonitorConfigBo {
            idle_threshold_min: match raw.get(KEY_IDLE_THRESHOLD) {
                Some(value) => parse_int(KEY_IDLE_THRESHOLD, value)?,
                None => self.defaults.idle_threshold_min,
            },
            interval_sec: match raw.get(KEY_INTERVAL) {
                Some(value) => parse_int(KEY_INTERVAL, value)?,
                None => self.defaults.interval_sec,
            },
            notify_first: match raw.get(KEY_NOTIFY_FIRST) {
                Some(value) => parse_bool(KEY_NOTIFY_FIRST, value)?,
                None => self.defaults.notify_first,
            },
            no_recovery: match raw.get(KEY_NO_RECOVERY) {
                Some(value) => parse_bool(KEY_NO_RECOVERY, value)?,
                None => self.defaults.no_recovery,
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub async fn save_config(&self, config: &MonitorConfigBo) -> Result<(), MonitorError> {
        config.validate()?;
        let conn = self.sqlite.open().await?;
        let table_name = self.table_name;
        let pairs = to_pairs(config);

        conn.call(move |conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    format!(
                        "INSERT INTO {} (key, value) VALUES (?1, ?2)
                        ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                        table_name
                    )
                    .as_str(),
                )?;
                for (key, value) in pairs.iter() {
                    stmt.execute(params![key, value])?;
                }
            }
            tx.commit()
        })
        .await?;

        info!(TAG, "settings saved: {:?}", config);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::TempDir;

    fn defaults() -> MonitorConfigBo {
        MonitorConfigBo {
            idle_threshold_min: 10,
            interval_sec: 10,
            notify_first: true,
            no_recovery: false,
        }
    }

    async fn setup() -> (TempDir, SettingDao) {
        let dir = tempfile::tempdir().unwrap();
        let sqlite = SqliteConnection::new(dir.path().join("setting.db").to_str().unwrap()).unwrap();
        let dao = SettingDao::new(Arc::new(sqlite), defaults());
        dao.ensure_table_exist().await.unwrap();
        (dir, dao)
    }

    async fn write_raw(dao: &SettingDao, key: &'static str, value: &'static str) {
        let conn = dao.sqlite().open().await.unwrap();
        conn.call(move |conn| {
            conn.execute(
                "INSERT INTO setting (key, value) VALUES (?1, ?2) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_empty_table_uses_defaults() {
        let (_dir, dao) = setup().await;
        assert_eq!(dao.load_config().await.unwrap(), defaults());
    }

    #[tokio::test]
    async fn test_seed_does_not_override_saved_values() {
        let (_dir, dao) = setup().await;
        let saved = MonitorConfigBo {
            idle_threshold_min: 25,
            interval_sec: 60,
            notify_first: false,
            no_recovery: true,
        };
        dao.save_config(&saved).await.unwrap();
        dao.seed_defaults().await.unwrap();
        assert_eq!(dao.load_config().await.unwrap(), saved);
    }

    #[tokio::test]
    async fn test_non_numeric_value_is_rejected() {
        let (_dir, dao) = setup().await;
        dao.seed_defaults().await.unwrap();
        write_raw(&dao, "idle_threshold_min", "ten").await;
        let err = dao.load_config().await.unwrap_err();
        assert!(matches!(err, MonitorError::InvalidSetting { key, .. } if key == "idle_threshold_min"));
    }

    #[tokio::test]
    async fn test_out_of_range_value_is_rejected() {
        let (_dir, dao) = setup().await;
        write_raw(&dao, "interval_sec", "2").await;
        assert!(dao.load_config().await.is_err());

        let invalid = MonitorConfigBo { interval_sec: 1, ..defaults() };
        assert!(dao.save_config(&invalid).await.is_err());
    }

    #[tokio::test]
    async fn test_bool_text() {
        let (_dir, dao) = setup().await;
        write_raw(&dao, "notify_first", "0").await;
        write_raw(&dao, "no_recovery", "1").await;
        let config = dao.load_config().await.unwrap();
        assert!(!config.notify_first);
        assert!(config.no_recovery);

        write_raw(&dao, "no_recovery", "yes").await;
        assert!(dao.load_config().await.is_err());
    }
}
