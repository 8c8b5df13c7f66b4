use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use loyalty_engine::{
    db_types::{Balance, OrderNumber, Points, Withdrawal},
    traits::LedgerError,
    LedgerApi,
};
use serde_json::json;

use super::{
    helpers::{authenticated, send},
    mocks::MockBalanceManager,
};
use crate::routes::{MyBalanceRoute, MyWithdrawalsRoute, WithdrawRoute};

const USER: i64 = 5;

fn configure(balances: MockBalanceManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(LedgerApi::new(balances)))
            .service(MyBalanceRoute::<MockBalanceManager>::new())
            .service(WithdrawRoute::<MockBalanceManager>::new())
            .service(MyWithdrawalsRoute::<MockBalanceManager>::new());
    }
}

fn withdraw(body: serde_json::Value) -> TestRequest {
    authenticated(TestRequest::post().uri("/balance/withdraw"), USER).set_json(body)
}

fn withdrawal(id: i64, number: &str, hundredths: i64) -> Withdrawal {
    Withdrawal {
        id,
        user_id: USER,
        order_number: OrderNumber::from(number),
        amount: Points::from_hundredths(hundredths),
        processed_at: Utc.with_ymd_and_hms(2024, 3, 2, 9, 30, id as u32).unwrap(),
    }
}

#[actix_web::test]
async fn fetch_my_balance() {
    let _ = env_logger::try_init().ok();
    let mut balances = MockBalanceManager::new();
    balances.expect_fetch_balance().withf(|id| *id == USER).returning(|user_id| {
        Ok(Balance { user_id, current: Points::from_hundredths(50_050), withdrawn: Points::from_whole(42) })
    });
    let res = send(authenticated(TestRequest::get().uri("/balance"), USER), configure(balances)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({"current": 500.5, "withdrawn": 42.0}));
}

#[actix_web::test]
async fn balance_needs_a_session() {
    let _ = env_logger::try_init().ok();
    let mut balances = MockBalanceManager::new();
    balances.expect_fetch_balance().never();
    let res = send(TestRequest::get().uri("/balance"), configure(balances)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn successful_withdrawal() {
    let _ = env_logger::try_init().ok();
    let mut balances = MockBalanceManager::new();
    balances
        .expect_debit_balance()
        .withf(|w| w.user_id == USER && w.order_number.as_str() == "2377225624" && w.amount == Points::from_whole(751))
        .times(1)
        .returning(|w| Ok(withdrawal(1, w.order_number.as_str(), w.amount.hundredths())));
    let res = send(withdraw(json!({"order": "2377225624", "sum": 751})), configure(balances)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["order"], "2377225624");
    assert_eq!(res.json()["sum"], json!(751.0));
}

#[actix_web::test]
async fn withdrawal_beyond_the_balance() {
    let _ = env_logger::try_init().ok();
    let mut balances = MockBalanceManager::new();
    balances.expect_debit_balance().returning(|w| {
        Err(LedgerError::InsufficientFunds { available: Points::from_whole(5), requested: w.amount })
    });
    let res = send(withdraw(json!({"order": "2377225624", "sum": 10})), configure(balances)).await;
    assert_eq!(res.status, StatusCode::PAYMENT_REQUIRED);
    assert!(!res.error_message().is_empty());
}

#[actix_web::test]
async fn withdrawal_without_any_balance_is_payment_required() {
    let _ = env_logger::try_init().ok();
    let mut balances = MockBalanceManager::new();
    balances
        .expect_debit_balance()
        .returning(|w| Err(LedgerError::InsufficientFunds { available: Points::default(), requested: w.amount }));
    let res = send(withdraw(json!({"order": "2377225624", "sum": 1})), configure(balances)).await;
    assert_eq!(res.status, StatusCode::PAYMENT_REQUIRED);
}

#[actix_web::test]
async fn balance_overflow_is_a_server_error() {
    let _ = env_logger::try_init().ok();
    let mut balances = MockBalanceManager::new();
    balances.expect_debit_balance().returning(|w| Err(LedgerError::BalanceOverflow(w.user_id)));
    let res = send(withdraw(json!({"order": "2377225624", "sum": 1})), configure(balances)).await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!res.error_message().is_empty());
}

#[actix_web::test]
async fn invalid_withdrawals_never_reach_the_ledger() {
    let _ = env_logger::try_init().ok();
    for body in [
        json!({"order": "2377225625", "sum": 10}),
        json!({"order": "2377225624", "sum": 0}),
        json!({"order": "2377225624", "sum": -5}),
    ] {
        let mut balances = MockBalanceManager::new();
        balances.expect_debit_balance().never();
        let res = send(withdraw(body.clone()), configure(balances)).await;
        assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY, "body: {body}");
    }
}

#[actix_web::test]
async fn malformed_withdrawal_requests() {
    let _ = env_logger::try_init().ok();
    for body in [json!({"order": "2377225624"}), json!({"order": "2377225624", "sum": "ten"}), json!([])] {
        let mut balances = MockBalanceManager::new();
        balances.expect_debit_balance().never();
        let res = send(withdraw(body.clone()), configure(balances)).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "body: {body}");
    }
}

#[actix_web::test]
async fn list_my_withdrawals() {
    let _ = env_logger::try_init().ok();
    let mut balances = MockBalanceManager::new();
    balances
        .expect_fetch_withdrawals()
        .withf(|id| *id == USER)
        .returning(|_| Ok(vec![withdrawal(2, "2377225624", 50_000), withdrawal(1, "79927398713", 125)]));
    let res = send(authenticated(TestRequest::get().uri("/withdrawals"), USER), configure(balances)).await;
    assert_eq!(res.status, StatusCode::OK);
    let expected = json!([
        {"order": "2377225624", "sum": 500.0, "processed_at": "2024-03-02T09:30:02+00:00"},
        {"order": "79927398713", "sum": 1.25, "processed_at": "2024-03-02T09:30:01+00:00"},
    ]);
    assert_eq!(res.json(), expected);
}

#[actix_web::test]
async fn no_withdrawals_is_no_content() {
    let _ = env_logger::try_init().ok();
    let mut balances = MockBalanceManager::new();
    balances.expect_fetch_withdrawals().returning(|_| Ok(vec![]));
    let res = send(authenticated(TestRequest::get().uri("/withdrawals"), USER), configure(balances)).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
}
