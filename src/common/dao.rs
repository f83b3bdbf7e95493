use async_trait::async_trait;

use super::error::MonitorError;
use super::sqlite::SqliteConnection;

/// dao 特征
#[async_trait]
pub trait Dao {
    fn sqlite(&self) -> &SqliteConnection;

    fn table_name(&self) -> &'static str;

    /// 检查表是否存在
    async fn check_table(&self) -> Result<bool, MonitorError> {
        let conn = self.sqlite().open().await?;
        let table_name = self.table_name();

        let result = conn
            .call(move |conn| {
                let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type='table' AND name=?1")?;
                let exists = stmt.exists([table_name])?;
                Ok(exists)
            })
            .await?;
        Ok(result)
    }

    /// 创建数据表
    async fn create_table(&self) -> Result<(), MonitorError>;

    /// 删除数据表
    async fn drop_table(&self) -> Result<(), MonitorError> {
        let conn = self.sqlite().open().await?;
        let table_name = self.table_name();

        conn.call(move |conn| conn.execute(format!("DROP TABLE IF EXISTS {}", table_name).as_str(), ()))
            .await?;
        Ok(())
    }

    /// 表不存在时创建
    async fn ensure_table_exist(&self) -> Result<(), MonitorError> {
        if !self.check_table().await? {
            self.create_table().await?;
        }
        Ok(())
    }
}
