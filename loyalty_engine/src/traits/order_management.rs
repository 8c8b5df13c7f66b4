use thiserror::Error;

use crate::{
    db_types::{NewOrder, Order, OrderNumber},
    traits::InsertOrderResult,
};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order number {0} is not a valid order number")]
    InvalidOrderNumber(String),
    #[error("Order {0} has already been submitted by another user")]
    OwnedByAnotherUser(OrderNumber),
}

impl From<sqlx::Error> for OrderFlowError {
    fn from(e: sqlx::Error) -> Self {
        OrderFlowError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Stores a new order with status `NEW`. If an order with the same number already exists, it is returned as-is
    /// and nothing is written.
    async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, OrderFlowError>;

    async fn fetch_order(&self, number: &OrderNumber) -> Result<Option<Order>, OrderFlowError>;

    /// All orders submitted by the user, newest first.
    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderFlowError>;
}
