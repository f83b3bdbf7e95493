use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ErrorCode {
    // 未知错误
    UnknownError = 1000,
    // 上游设备 api 请求错误
    UpstreamError = 1001,
    // sqlite 读写错误
    StorageError = 1002,
    // 邮件发送错误
    MailError = 1003,
    // 数据库中的参数无法解析
    InvalidSetting = 1004,
    // 请求参数错误
    InvalidInput = 1005,
    // 认证失败
    Unauthorized = 1006,
    // 配置文件错误
    ConfigError = 1007,
}

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("upstream request error: {0}")]
    Upstream(String),

    #[error("storage error: {0}")]
    Storage(#[from] tokio_rusqlite::Error),

    #[error("mail error: {0}")]
    Mail(String),

    #[error("invalid setting {key}={value}: {msg}")]
    InvalidSetting {
        key: String,
        value: String,
        msg: String,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("authentication required")]
    Unauthorized,

    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl MonitorError {
    pub fn code(&self) -> ErrorCode {
        match self {
            MonitorError::Upstream(_) => ErrorCode::UpstreamError,
            MonitorError::Storage(_) => ErrorCode::StorageError,
            MonitorError::Mail(_) => ErrorCode::MailError,
            MonitorError::InvalidSetting { .. } => ErrorCode::InvalidSetting,
            MonitorError::InvalidInput(_) => ErrorCode::InvalidInput,
            MonitorError::Unauthorized => ErrorCode::Unauthorized,
            MonitorError::Config(_) => ErrorCode::ConfigError,
            MonitorError::Internal(_) => ErrorCode::UnknownError,
        }
    }
}

impl From<reqwest::Error> for MonitorError {
    fn from(e: reqwest::Error) -> Self {
        MonitorError::Upstream(e.to_string())
    }
}

impl From<minijinja::Error> for MonitorError {
    fn from(e: minijinja::Error) -> Self {
        MonitorError::Internal(format!("render mail template: {}", e))
    }
}

impl ResponseError for MonitorError {
    fn status_code(&self) -> StatusCode {
        match self {
            MonitorError::InvalidInput(_) | MonitorError::InvalidSetting { .. } => {
                StatusCode::BAD_REQUEST
            }
            MonitorError::Unauthorized => StatusCode::UNAUTHORIZED,
            MonitorError::Upstream(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let MonitorError::Unauthorized = self {
            builder.insert_header((header::WWW_AUTHENTICATE, r#"Basic realm="Login Required""#));
        }
        builder.json(json!({
            "code": self.code() as u32,
            "msg": self.to_string(),
        }))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        assert_eq!(MonitorError::Upstream("timeout".into()).code(), ErrorCode::UpstreamError);
        assert_eq!(MonitorError::Mail("refused".into()).code(), ErrorCode::MailError);
        assert_eq!(MonitorError::Unauthorized.code() as u32, 1006);
    }

    #[test]
    fn test_unauthorized_response_has_challenge() {
        let resp = MonitorError::Unauthorized.error_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let challenge = resp.headers().get(header::WWW_AUTHENTICATE).unwrap();
        assert_eq!(challenge.to_str().unwrap(), r#"Basic realm="Login Required""#);
    }

    #[test]
    fn test_invalid_setting_is_bad_request() {
        let err = MonitorError::InvalidSetting {
            key: "interval_sec".into(),
            value: "abc".into(),
            msg: "not an integer".into(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("interval_sec=abc"));
    }
}
