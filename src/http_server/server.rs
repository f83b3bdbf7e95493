//! 管理接口：监控设备列表、运行参数、设备状态、最近一次周期结果

use actix_web::{delete, get, post, put, web, App, HttpResponse, HttpServer, Responder};
use serde_json::json;
use std::sync::Arc;

use super::auth::AdminAuth;
use crate::common::error::MonitorError;
use crate::common::setting::Web;
use crate::entity::bo::monitor_config_bo::MonitorConfigBo;
use crate::entity::dto::api_dto::{AddDeviceDto, WatchedDevicesDto};
use crate::info;
use crate::monitor_controller::monitor_manager::MonitorManager;

const LOG_TAG: &str = "http-server";

pub struct AppState {
    pub manager: Arc<MonitorManager>,
    /// (user, password), None disables basic auth
    pub credentials: Option<(String, String)>,
}

#[get("/healthz")]
async fn healthz() -> impl Responder {
    HttpResponse::Ok().content_type("text/plain").body("ok")
}

#[get("/api/devices")]
async fn list_devices(_auth: AdminAuth, state: web::Data<AppState>) -> Result<HttpResponse, MonitorError> {
    let devices = state.manager.list_devices().await?;
    Ok(HttpResponse::Ok().json(WatchedDevicesDto { devices }))
}

#[post("/api/devices")]
async fn add_device(
    _auth: AdminAuth,
    state: web::Data<AppState>,
    body: web::Json<AddDeviceDto>,
) -> Result<HttpResponse, MonitorError> {
    let dev_id = body.validated_id()?;
    let added = state.manager.add_device(&dev_id).await?;
    Ok(HttpResponse::Ok().json(json!({"dev_id": dev_id, "added": added})))
}

#[delete("/api/devices/{dev_id}")]
async fn remove_device(
    _auth: AdminAuth,
    state: web::Data<AppState>,
    dev_id: web::Path<String>,
) -> Result<HttpResponse, MonitorError> {
    let dev_id = dev_id.into_inner();
    let removed = state.manager.remove_device(&dev_id).await?;
    Ok(HttpResponse::Ok().json(json!({"dev_id": dev_id, "removed": removed})))
}

#[get("/api/settings")]
async fn get_settings(_auth: AdminAuth, state: web::Data<AppState>) -> Result<HttpResponse, MonitorError> {
    let config = state.manager.load_config().await?;
    Ok(HttpResponse::Ok().json(config))
}

#[put("/api/settings")]
async fn put_settings(
    _auth: AdminAuth,
    state: web::Data<AppState>,
    body: web::Json<MonitorConfigBo>,
) -> Result<HttpResponse, MonitorError> {
    let config = body.into_inner();
    state.manager.save_config(&config).await?;
    Ok(HttpResponse::Ok().json(config))
}

#[get("/api/states")]
async fn list_states(_auth: AdminAuth, state: web::Data<AppState>) -> Result<HttpResponse, MonitorError> {
    let states = state.manager.list_states().await?;
    Ok(HttpResponse::Ok().json(states))
}

#[get("/api/monitor")]
async fn last_report(_auth: AdminAuth, state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.manager.last_report())
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(healthz)
        .service(list_devices)
        .service(add_device)
        .service(remove_device)
        .service(get_settings)
        .service(put_settings)
        .service(list_states)
        .service(last_report);
}

/// run until the server receives a stop signal
pub async fn run(config: &Web, state: AppState) -> std::io::Result<()> {
    let data = web::Data::new(state);
    info!(LOG_TAG, "http server listening on {}:{}", config.web_host, config.web_port);
    HttpServer::new(move || App::new().app_data(data.clone()).configure(routes))
        .bind((config.web_host.as_str(), config.web_port))?
        .run()
        .await
}
