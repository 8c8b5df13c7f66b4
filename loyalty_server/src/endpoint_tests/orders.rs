use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use loyalty_engine::{
    db_types::OrderStatusType,
    traits::{InsertOrderResult, OrderFlowError},
    OrderFlowApi,
    OrderIntake,
};
use serde_json::json;

use super::{
    helpers::{authenticated, sample_order, send},
    mocks::MockOrderManager,
};
use crate::routes::{MyOrdersRoute, SubmitOrderRoute};

const USER: i64 = 1;
const OTHER_USER: i64 = 2;

fn configure(orders: MockOrderManager, intake: OrderIntake) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(OrderFlowApi::new(orders, intake)))
            .service(SubmitOrderRoute::<MockOrderManager>::new())
            .service(MyOrdersRoute::<MockOrderManager>::new());
    }
}

fn submit(number: &str) -> TestRequest {
    authenticated(TestRequest::post().uri("/orders").insert_header(("Content-Type", "text/plain")), USER)
        .set_payload(number.to_string())
}

#[actix_web::test]
async fn new_orders_are_accepted_and_queued() {
    let _ = env_logger::try_init().ok();
    let (intake, mut queue) = OrderIntake::channel(4);
    let mut orders = MockOrderManager::new();
    orders
        .expect_insert_order()
        .withf(|o| o.number.as_str() == "79927398713" && o.user_id == USER)
        .times(1)
        .returning(|o| {
            Ok(InsertOrderResult::Inserted(sample_order(1, o.number.as_str(), o.user_id, OrderStatusType::New, None)))
        });
    let res = send(submit("79927398713\n"), configure(orders, intake)).await;
    assert_eq!(res.status, StatusCode::ACCEPTED);
    assert_eq!(res.json()["number"], "79927398713");
    assert_eq!(res.json()["status"], "NEW");
    assert_eq!(queue.try_recv().unwrap().as_str(), "79927398713");
}

#[actix_web::test]
async fn resubmitting_your_own_order() {
    let _ = env_logger::try_init().ok();
    let (intake, mut queue) = OrderIntake::channel(4);
    let mut orders = MockOrderManager::new();
    orders.expect_insert_order().returning(|o| {
        Ok(InsertOrderResult::AlreadyExists(sample_order(1, o.number.as_str(), USER, OrderStatusType::Processing, None)))
    });
    let res = send(submit("79927398713"), configure(orders, intake)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["status"], "PROCESSING");
    assert!(queue.try_recv().is_err(), "A known order must not be queued again");
}

#[actix_web::test]
async fn submitting_another_users_order() {
    let _ = env_logger::try_init().ok();
    let (intake, _queue) = OrderIntake::channel(4);
    let mut orders = MockOrderManager::new();
    orders.expect_insert_order().returning(|o| {
        Ok(InsertOrderResult::AlreadyExists(sample_order(1, o.number.as_str(), OTHER_USER, OrderStatusType::New, None)))
    });
    let res = send(submit("79927398713"), configure(orders, intake)).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.error_message(), "Order 79927398713 was submitted by another user");
}

#[actix_web::test]
async fn order_numbers_must_pass_the_luhn_check() {
    let _ = env_logger::try_init().ok();
    let (intake, _queue) = OrderIntake::channel(4);
    let mut orders = MockOrderManager::new();
    orders.expect_insert_order().never();
    let res = send(submit("79927398710"), configure(orders, intake)).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn order_bodies_must_be_digits() {
    let _ = env_logger::try_init().ok();
    for body in ["", "   ", "7992-7398-713", "{\"order\": \"79927398713\"}"] {
        let (intake, _queue) = OrderIntake::channel(4);
        let mut orders = MockOrderManager::new();
        orders.expect_insert_order().never();
        let res = send(submit(body), configure(orders, intake)).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "body: {body}");
    }
}

#[actix_web::test]
async fn orders_need_a_session() {
    let _ = env_logger::try_init().ok();
    let (intake, _queue) = OrderIntake::channel(4);
    let mut orders = MockOrderManager::new();
    orders.expect_insert_order().never();
    orders.expect_fetch_orders_for_user().never();
    let cfg = configure(orders, intake);
    let req = TestRequest::post().uri("/orders").set_payload("79927398713");
    let res = send(req, cfg).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let (intake, _queue) = OrderIntake::channel(4);
    let mut orders = MockOrderManager::new();
    orders.expect_fetch_orders_for_user().never();
    let req = TestRequest::get().uri("/orders").insert_header(("Cookie", "auth_token=1:forged"));
    let res = send(req, configure(orders, intake)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn list_my_orders() {
    let _ = env_logger::try_init().ok();
    let (intake, _queue) = OrderIntake::channel(4);
    let mut orders = MockOrderManager::new();
    orders.expect_fetch_orders_for_user().withf(|id| *id == USER).returning(|_| {
        Ok(vec![
            sample_order(3, "4561261212345467", USER, OrderStatusType::Processed, Some(50_050)),
            sample_order(2, "12345678903", USER, OrderStatusType::Invalid, None),
            sample_order(1, "79927398713", USER, OrderStatusType::New, None),
        ])
    });
    let req = authenticated(TestRequest::get().uri("/orders"), USER);
    let res = send(req, configure(orders, intake)).await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    let expected = json!({
        "number": "4561261212345467",
        "status": "PROCESSED",
        "accrual": 500.5,
        "uploaded_at": "2024-03-01T12:00:03+00:00"
    });
    assert_eq!(body[0], expected);
    assert_eq!(body[1]["status"], "INVALID");
    assert!(body[1].get("accrual").is_none());
    assert_eq!(body[2]["number"], "79927398713");
}

#[actix_web::test]
async fn no_orders_is_no_content() {
    let _ = env_logger::try_init().ok();
    let (intake, _queue) = OrderIntake::channel(4);
    let mut orders = MockOrderManager::new();
    orders.expect_fetch_orders_for_user().returning(|_| Ok(vec![]));
    let req = authenticated(TestRequest::get().uri("/orders"), USER);
    let res = send(req, configure(orders, intake)).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    assert!(res.body.is_empty());
}

#[actix_web::test]
async fn order_storage_failures() {
    let _ = env_logger::try_init().ok();
    let (intake, _queue) = OrderIntake::channel(4);
    let mut orders = MockOrderManager::new();
    orders.expect_insert_order().returning(|_| Err(OrderFlowError::DatabaseError("database is locked".into())));
    let res = send(submit("79927398713"), configure(orders, intake)).await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
}
