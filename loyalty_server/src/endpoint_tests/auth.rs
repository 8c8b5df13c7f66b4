use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::Utc;
use loyalty_engine::{
    db_types::UserAccount,
    helpers::hash_password,
    traits::AuthApiError,
    AuthApi,
};
use serde_json::json;

use super::{
    helpers::{send, test_signer},
    mocks::MockUserManager,
};
use crate::{
    auth::AUTH_COOKIE,
    routes::{LoginRoute, RegisterRoute},
};

fn account(id: i64, login: &str, password: &str) -> UserAccount {
    UserAccount { id, login: login.to_string(), password_hash: hash_password(password), created_at: Utc::now() }
}

fn configure(users: MockUserManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(AuthApi::new(users)))
            .service(RegisterRoute::<MockUserManager>::new())
            .service(LoginRoute::<MockUserManager>::new());
    }
}

fn register_request(body: serde_json::Value) -> TestRequest {
    TestRequest::post().uri("/register").set_json(body)
}

fn login_request(body: serde_json::Value) -> TestRequest {
    TestRequest::post().uri("/login").set_json(body)
}

/// The user id carried by a `Set-Cookie` header, if it is a valid session cookie
fn session_user(set_cookie: Option<&str>) -> Option<i64> {
    let value = set_cookie?.split(';').next()?.strip_prefix(&format!("{AUTH_COOKIE}="))?.to_string();
    test_signer().verify(&value)
}

#[actix_web::test]
async fn register_sets_a_session_cookie() {
    let _ = env_logger::try_init().ok();
    let mut users = MockUserManager::new();
    users
        .expect_create_user()
        .withf(|u| u.login == "alice" && u.password_hash != "correct horse")
        .times(1)
        .returning(|u| Ok(UserAccount { id: 7, login: u.login, password_hash: u.password_hash, created_at: Utc::now() }));
    let res = send(register_request(json!({"login": "alice", "password": "correct horse"})), configure(users)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(session_user(res.set_cookie.as_deref()), Some(7));
}

#[actix_web::test]
async fn register_with_a_taken_login() {
    let _ = env_logger::try_init().ok();
    let mut users = MockUserManager::new();
    users.expect_create_user().returning(|u| Err(AuthApiError::LoginTaken(u.login)));
    let res = send(register_request(json!({"login": "alice", "password": "correct horse"})), configure(users)).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.error_message(), "The login alice is already taken");
    assert!(res.set_cookie.is_none());
}

#[actix_web::test]
async fn register_with_bad_input() {
    let _ = env_logger::try_init().ok();
    // Malformed input never reaches the database
    let mut users = MockUserManager::new();
    users.expect_create_user().never();
    let res = send(register_request(json!({"login": "alice"})), configure(users)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let mut users = MockUserManager::new();
    users.expect_create_user().never();
    let res = send(register_request(json!({"login": "al", "password": "correct horse"})), configure(users)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let mut users = MockUserManager::new();
    users.expect_create_user().never();
    let req = TestRequest::post().uri("/register").insert_header(("Content-Type", "application/json")).set_payload("{");
    let res = send(req, configure(users)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(!res.error_message().is_empty());
}

#[actix_web::test]
async fn login_with_correct_credentials() {
    let _ = env_logger::try_init().ok();
    let mut users = MockUserManager::new();
    let alice = account(3, "alice", "correct horse");
    users.expect_fetch_user_by_login().withf(|login| login == "alice").returning(move |_| Ok(Some(alice.clone())));
    let res = send(login_request(json!({"login": "alice", "password": "correct horse"})), configure(users)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(session_user(res.set_cookie.as_deref()), Some(3));
}

#[actix_web::test]
async fn login_failures_look_the_same() {
    let _ = env_logger::try_init().ok();
    let mut users = MockUserManager::new();
    let alice = account(3, "alice", "correct horse");
    users.expect_fetch_user_by_login().withf(|login| login == "alice").returning(move |_| Ok(Some(alice.clone())));
    let res = send(login_request(json!({"login": "alice", "password": "battery staple"})), configure(users)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert!(res.set_cookie.is_none());
    let wrong_password = res.error_message();

    let mut users = MockUserManager::new();
    users.expect_fetch_user_by_login().returning(|_| Ok(None));
    let res = send(login_request(json!({"login": "mallory", "password": "battery staple"})), configure(users)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.error_message(), wrong_password);
}

#[actix_web::test]
async fn database_errors_are_internal_errors() {
    let _ = env_logger::try_init().ok();
    let mut users = MockUserManager::new();
    users.expect_fetch_user_by_login().returning(|_| Err(AuthApiError::DatabaseError("disk I/O error".into())));
    let res = send(login_request(json!({"login": "alice", "password": "correct horse"})), configure(users)).await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
}
