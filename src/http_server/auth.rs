//! http basic auth，只有配置了用户名和密码时才启用

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures::future::{ready, Ready};

use super::server::AppState;
use crate::common::error::MonitorError;
use crate::warn;

const LOG_TAG: &str = "http-auth";

/// extractor guarding the admin routes, put it first in the handler arguments
pub struct AdminAuth;

impl FromRequest for AdminAuth {
    type Error = MonitorError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(check(req))
    }
}

fn check(req: &HttpRequest) -> Result<AdminAuth, MonitorError> {
    let Some(state) = req.app_data::<web::Data<AppState>>() else {
        return Err(MonitorError::Internal(String::from("app state missing")));
    };
    let Some((user, pass)) = &state.credentials else {
        return Ok(AdminAuth);
    };

    match basic_credentials(req) {
        Some((given_user, given_pass)) if &given_user == user && &given_pass == pass => Ok(AdminAuth),
        Some((given_user, _)) => {
            warn!(LOG_TAG, "login failed for user {:?} from {:?}", given_user, req.peer_addr());
            Err(MonitorError::Unauthorized)
        }
        None => Err(MonitorError::Unauthorized),
    }
}

/// decode `Authorization: Basic base64(user:pass)`
fn basic_credentials(req: &HttpRequest) -> Option<(String, String)> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let text = String::from_utf8(decoded).ok()?;
    let (user, pass) = text.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

#[cfg(test)]
mod test {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_basic_credentials() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, format!("Basic {}", STANDARD.encode("admin:p:w"))))
            .to_http_request();
        assert_eq!(basic_credentials(&req), Some((String::from("admin"), String::from("p:w"))));

        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer abc"))
            .to_http_request();
        assert_eq!(basic_credentials(&req), None);

        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Basic !!!"))
            .to_http_request();
        assert_eq!(basic_credentials(&req), None);
    }
}
