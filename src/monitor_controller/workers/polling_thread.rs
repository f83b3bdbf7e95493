use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::monitor_controller::monitor_manager::MonitorManager;
use crate::{info, warn};

const LOG_TAG: &'static str = "monitor_polling_thread";

/// device polling thread
/// runs one monitor cycle, then sleeps for the interval currently stored in the setting table.
/// cycles never overlap; cancellation is only observed while sleeping
pub fn polling_thread(
    manager: Arc<MonitorManager>,
    fallback_interval_sec: i64,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(LOG_TAG, "polling thread starting");
        loop {
            // 1. one full cycle
            manager.run_tick(Utc::now()).await;

            // 2. interval may have been changed through the api
            let interval_sec = match manager.load_config().await {
                Ok(config) => config.interval_sec,
                Err(e) => {
                    warn!(LOG_TAG, "cannot read interval, using {} sec: {}", fallback_interval_sec, e);
                    fallback_interval_sec
                }
            };

            // 3. sleep or stop
            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(Duration::from_secs(interval_sec.max(1) as u64)) => {}
            }
        }
        info!(LOG_TAG, "polling thread stopped");
    })
}
