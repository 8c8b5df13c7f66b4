use log::{debug, trace};
use sqlx::PgConnection;

use crate::{
    db_types::{NewOrder, Order, OrderNumber, OrderStatusType, SettlementUpdate},
    traits::InsertOrderResult,
};

/// Inserts the order with status `NEW`. If an order with the same number already exists, that order is returned
/// instead and nothing is written.
pub async fn idempotent_insert(order: NewOrder, conn: &mut PgConnection) -> Result<InsertOrderResult, sqlx::Error> {
    let inserted: Option<Order> = sqlx::query_as(
        r#"
            INSERT INTO orders (number, user_id) VALUES ($1, $2)
            ON CONFLICT (number) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(order.number.as_str())
    .bind(order.user_id)
    .fetch_optional(&mut *conn)
    .await?;
    match inserted {
        Some(order) => {
            debug!("📝️ Order [{}] inserted with id {}", order.number, order.id);
            Ok(InsertOrderResult::Inserted(order))
        },
        None => {
            let existing = fetch_order_by_number(&order.number, conn).await?.ok_or(sqlx::Error::RowNotFound)?;
            trace!("📝️ Order [{}] already exists with id {}", existing.number, existing.id);
            Ok(InsertOrderResult::AlreadyExists(existing))
        },
    }
}

pub async fn fetch_order_by_number(number: &OrderNumber, conn: &mut PgConnection) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE number = $1").bind(number.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

/// Reads the order and locks its row until the transaction ends.
pub async fn lock_order(number: &OrderNumber, conn: &mut PgConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE number = $1 FOR UPDATE")
        .bind(number.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Orders for the user, newest first.
pub async fn fetch_orders_for_user(user_id: i64, conn: &mut PgConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY uploaded_at DESC, id DESC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// Every order that has not reached a terminal status, oldest first.
pub async fn fetch_pending_orders(conn: &mut PgConnection) -> Result<Vec<Order>, sqlx::Error> {
    let [new, processing] = OrderStatusType::pending();
    let orders = sqlx::query_as("SELECT * FROM orders WHERE status IN ($1, $2) ORDER BY uploaded_at ASC, id ASC")
        .bind(new)
        .bind(processing)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// Writes the new status and accrual to the order. The caller is responsible for checking that the move is allowed,
/// with the order row locked.
pub async fn set_status(update: &SettlementUpdate, conn: &mut PgConnection) -> Result<Order, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET status = $1, accrual = $2, updated_at = now()
            WHERE number = $3
            RETURNING *;
        "#,
    )
    .bind(update.status)
    .bind(update.reward)
    .bind(update.number.as_str())
    .fetch_one(conn)
    .await?;
    Ok(order)
}
