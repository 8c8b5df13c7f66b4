use actix_web::{
    http::{header, StatusCode},
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use chrono::{TimeZone, Utc};
use log::debug;
use loyalty_engine::db_types::{Order, OrderNumber, OrderStatusType, Points};
use lpg_common::Secret;

use crate::{
    auth::{CookieSigner, AUTH_COOKIE},
    config::ServerOptions,
    routes::json_config,
};

pub struct TestResponse {
    pub status: StatusCode,
    pub body: String,
    /// The raw `Set-Cookie` header, if the response carried one
    pub set_cookie: Option<String>,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap_or_else(|e| panic!("Response is not JSON ({e}): {}", self.body))
    }

    pub fn error_message(&self) -> String {
        self.json()["error"].as_str().map(String::from).unwrap_or_default()
    }
}

// DO NOT re-use this key anywhere.
pub fn test_signer() -> CookieSigner {
    CookieSigner::new(&Secret::new("endpoint tests cookie secret".to_string())).unwrap()
}

/// A `Cookie` header value that authenticates `user_id`
pub fn session_for(user_id: i64) -> String {
    format!("{AUTH_COOKIE}={}", test_signer().sign(user_id))
}

/// Sends `req` to an app carrying the shared app data plus whatever `configure` adds.
pub async fn send<F>(req: TestRequest, configure: F) -> TestResponse
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new()
        .app_data(web::Data::new(test_signer()))
        .app_data(web::Data::new(ServerOptions::default()))
        .app_data(json_config())
        .configure(configure);
    let service = test::init_service(app).await;
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let set_cookie = res.headers().get(header::SET_COOKIE).and_then(|v| v.to_str().ok()).map(String::from);
    let body = String::from_utf8_lossy(&test::read_body(res).await).into_owned();
    debug!("Response: {status} {body}");
    TestResponse { status, body, set_cookie }
}

pub fn authenticated(req: TestRequest, user_id: i64) -> TestRequest {
    req.insert_header((header::COOKIE, session_for(user_id)))
}

pub fn sample_order(id: i64, number: &str, user_id: i64, status: OrderStatusType, accrual: Option<i64>) -> Order {
    let uploaded_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, id as u32).unwrap();
    Order {
        id,
        number: OrderNumber::from(number),
        user_id,
        status,
        accrual: accrual.map(Points::from_hundredths),
        uploaded_at,
        updated_at: uploaded_at,
    }
}
