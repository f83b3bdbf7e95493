//! setting config file
//! 读取 config_{ENV}.toml，并允许 DISPL_ 前缀的环境变量覆盖，例如 DISPL_SMTP__PASSWORD

use config::{Config, Environment, File};
use lazy_static::lazy_static;
use serde::Deserialize;
use std::env;

use super::error::MonitorError;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Meta {
    pub application_name: String,
}

impl Default for Meta {
    fn default() -> Self {
        Meta {
            application_name: String::from("displ-monitor"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Env {
    pub env: String,
    pub log_level: String,
}

impl Default for Env {
    fn default() -> Self {
        Env {
            env: String::from("dev"),
            log_level: String::from("info"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Web {
    pub web_host: String,
    pub web_port: u16,
}

impl Default for Web {
    fn default() -> Self {
        Web {
            web_host: String::from("0.0.0.0"),
            web_port: 8000,
        }
    }
}

/// remote device api
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Upstream {
    pub base_url: String,
    pub devices_path: String,
    pub api_token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for Upstream {
    fn default() -> Self {
        Upstream {
            base_url: String::from("http://127.0.0.1:7001"),
            devices_path: String::from("/api/v1/devices"),
            api_token: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum MailTransport {
    Smtp,
    File,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Smtp {
    pub transport: MailTransport,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub use_tls: bool,
    pub from: String,
    /// comma separated recipient list
    pub to: String,
    pub subject_prefix: String,
    /// only used by the file transport
    pub file_path: String,
}

impl Default for Smtp {
    fn default() -> Self {
        Smtp {
            transport: MailTransport::Smtp,
            host: String::from("smtp.gmail.com"),
            port: 587,
            username: String::new(),
            password: String::new(),
            use_tls: true,
            from: String::new(),
            to: String::new(),
            subject_prefix: String::from("[DISPL]"),
            file_path: String::from("mail"),
        }
    }
}

impl Smtp {
    pub fn recipients(&self) -> Vec<String> {
        self.to
            .split(',')
            .map(|addr| addr.trim())
            .filter(|addr| !addr.is_empty())
            .map(|addr| addr.to_string())
            .collect()
    }

    /// sender falls back to the login user like most smtp relays expect
    pub fn sender(&self) -> &str {
        if self.from.is_empty() {
            self.username.as_str()
        } else {
            self.from.as_str()
        }
    }
}

/// default values of the monitor, written into the setting table on first start
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Monitor {
    pub db_path: String,
    pub idle_threshold_min: i64,
    pub interval_sec: i64,
    pub notify_first: bool,
    pub no_recovery: bool,
    pub cooldown_min: i64,
}

impl Default for Monitor {
    fn default() -> Self {
        Monitor {
            db_path: String::from("data/monitor.db"),
            idle_threshold_min: 10,
            interval_sec: 10,
            notify_first: true,
            no_recovery: false,
            cooldown_min: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Auth {
    pub admin_user: Option<String>,
    pub admin_pass: Option<String>,
}

impl Auth {
    /// basic auth is only enforced when both user and password are configured
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.admin_user, &self.admin_pass) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => {
                Some((user.as_str(), pass.as_str()))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
    pub meta: Meta,
    pub env: Env,
    pub web: Web,
    pub upstream: Upstream,
    pub smtp: Smtp,
    pub monitor: Monitor,
    pub auth: Auth,
}

impl Settings {
    /// build settings from config_{env}.toml and DISPL_* environment variables
    pub fn load(env_name: &str) -> Result<Self, MonitorError> {
        let settings = Config::builder()
            .add_source(File::with_name(format!("config_{}", env_name).as_str()).required(false))
            .add_source(
                Environment::with_prefix("DISPL")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize::<Settings>()?;
        Ok(settings)
    }

    pub fn get<'a>() -> &'a Self {
        // 给静态变量延迟赋值的宏
        lazy_static! {
            static ref CACHE: Settings = {
                let env_name = env::var("ENV").unwrap_or_else(|_| String::from("dev"));
                match Settings::load(env_name.as_str()) {
                    Ok(settings) => settings,
                    Err(e) => panic!("cannot load config for env {}: {}", env_name, e),
                }
            };
        }
        &CACHE
    }
}
