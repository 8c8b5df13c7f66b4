use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewOrder, Order, OrderNumber},
    helpers::is_valid_order_number,
    tracker::OrderIntake,
    traits::{InsertOrderResult, OrderFlowError, OrderManagement},
};

/// What happened to a submitted order.
#[derive(Debug, Clone)]
pub enum SubmitOrderResult {
    /// The order is new. It has been stored and handed to the order tracker.
    Accepted(Order),
    /// The same user submitted this order before. Nothing has changed.
    AlreadySubmitted(Order),
}

/// `OrderFlowApi` handles order submission and order history queries.
pub struct OrderFlowApi<B> {
    db: B,
    intake: OrderIntake,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, intake: OrderIntake) -> Self {
        Self { db, intake }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement
{
    /// Submit an order on behalf of a user.
    ///
    /// The order number must pass the Luhn check. A new order is stored with status `NEW` and handed to the order
    /// tracker; submission succeeds as soon as the order is stored, regardless of whether the tracker could take it
    /// right away.
    pub async fn submit_order(&self, user_id: i64, number: &str) -> Result<SubmitOrderResult, OrderFlowError> {
        if !is_valid_order_number(number) {
            debug!("🔄️📦️ User #{user_id} submitted an invalid order number: {number}");
            return Err(OrderFlowError::InvalidOrderNumber(number.to_string()));
        }
        let number = OrderNumber::from(number);
        match self.db.insert_order(NewOrder::new(number.clone(), user_id)).await? {
            InsertOrderResult::Inserted(order) => {
                info!("🔄️📦️ Order [{number}] accepted for user #{user_id}");
                self.intake.enqueue(number);
                Ok(SubmitOrderResult::Accepted(order))
            },
            InsertOrderResult::AlreadyExists(order) if order.user_id == user_id => {
                debug!("🔄️📦️ User #{user_id} re-submitted order [{number}]");
                Ok(SubmitOrderResult::AlreadySubmitted(order))
            },
            InsertOrderResult::AlreadyExists(order) => {
                warn!(
                    "🔄️📦️ User #{user_id} submitted order [{number}], which already belongs to user #{}",
                    order.user_id
                );
                Err(OrderFlowError::OwnedByAnotherUser(number))
            },
        }
    }

    /// The user's orders, newest first.
    pub async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderFlowError> {
        self.db.fetch_orders_for_user(user_id).await
    }

    pub async fn order(&self, number: &OrderNumber) -> Result<Option<Order>, OrderFlowError> {
        self.db.fetch_order(number).await
    }
}
