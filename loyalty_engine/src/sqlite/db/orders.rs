use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOrder, Order, OrderNumber, OrderStatusType, SettlementUpdate},
    traits::InsertOrderResult,
};

/// Inserts the order with status `NEW`. If an order with the same number already exists, that order is returned
/// instead and nothing is written.
pub async fn idempotent_insert(order: NewOrder, conn: &mut SqliteConnection) -> Result<InsertOrderResult, sqlx::Error> {
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

pub async fn fetch_order_by_number(
    number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE number = $1").bind(number.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

/// Orders for the user, newest first.
pub async fn fetch_orders_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY uploaded_at DESC, id DESC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// Every order that has not reached a terminal status, oldest first.
pub async fn fetch_pending_orders(conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let [new, processing] = OrderStatusType::pending();
    let orders = sqlx::query_as("SELECT * FROM orders WHERE status IN ($1, $2) ORDER BY uploaded_at ASC, id ASC")
        .bind(new.to_string())
        .bind(processing.to_string())
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// Writes the new status (and accrual) to the order, but only if doing so moves the order to a strictly higher-ranked
/// status. Returns the updated order, or `None` if nothing was written.
pub async fn advance_status(
    update: &SettlementUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET
                status = $1,
                accrual = $2,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            WHERE number = $3 AND
                (CASE status WHEN 'NEW' THEN 0 WHEN 'PROCESSING' THEN 1 ELSE 2 END) < $4
            RETURNING *;
        "#,
    )
    .bind(update.status.to_string())
    .bind(update.reward)
    .bind(update.number.as_str())
    .bind(i64::from(update.status.rank()))
    .fetch_optional(conn)
    .await?;
    Ok(order)
}
