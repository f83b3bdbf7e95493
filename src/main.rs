mod common;
mod entity;
mod http_server;
mod monitor_controller;
mod util;

use common::http::UpstreamClient;
use common::logger::init_logger;
use common::mail::MailSender;
use common::setting::Settings;
use common::sqlite::SqliteConnection;
use dotenv::dotenv;
use entity::bo::monitor_config_bo::MonitorConfigBo;
use http_server::server::{run as http_run, AppState};
use monitor_controller::monitor_manager::{MonitorManager, NotifyOptions};
use monitor_controller::workers::polling_thread::polling_thread;
use std::error::Error;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const TAG: &str = "main";

#[actix_web::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // 检查 env 文件
    dotenv().ok();

    // 加载 config
    let settings = Settings::get();

    // 设置 logger
    init_logger(settings.env.log_level.as_str())?;
    info!(TAG, "{} 配置已加载，环境: {:?}", settings.meta.application_name, settings.env.env);
    debug!(TAG, "upstream: {}{}", settings.upstream.base_url, settings.upstream.devices_path);

    // 监控管理器
    let sqlite = Arc::new(SqliteConnection::new(settings.monitor.db_path.as_str())?);
    let defaults = MonitorConfigBo {
        idle_threshold_min: settings.monitor.idle_threshold_min,
        interval_sec: settings.monitor.interval_sec,
        notify_first: settings.monitor.notify_first,
        no_recovery: settings.monitor.no_recovery,
    };
    let recipients = settings.smtp.recipients();
    if recipients.is_empty() {
        warn!(TAG, "smtp.to is empty, notifications will fail");
    }
    let options = NotifyOptions {
        recipients,
        subject_prefix: settings.smtp.subject_prefix.clone(),
        cooldown_min: settings.monitor.cooldown_min,
    };
    let manager = Arc::new(MonitorManager::new(
        sqlite,
        defaults,
        Arc::new(UpstreamClient::new(&settings.upstream)?),
        Arc::new(MailSender::new(&settings.smtp)?),
        options,
    ));
    manager.init().await?;

    // 轮询线程
    let token = CancellationToken::new();
    let worker = polling_thread(manager.clone(), settings.monitor.interval_sec, token.clone());

    // 执行 http 服务器，收到退出信号后返回
    let state = AppState {
        manager,
        credentials: settings
            .auth
            .credentials()
            .map(|(user, pass)| (user.to_string(), pass.to_string())),
    };
    let served = http_run(&settings.web, state).await;

    // 等待当前周期结束再退出
    token.cancel();
    worker.await?;
    served?;
    info!(TAG, "bye");
    Ok(())
}
