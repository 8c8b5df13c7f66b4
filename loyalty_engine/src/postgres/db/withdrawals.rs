use sqlx::PgConnection;

use crate::db_types::{NewWithdrawal, Withdrawal};

pub async fn insert_withdrawal(withdrawal: NewWithdrawal, conn: &mut PgConnection) -> Result<Withdrawal, sqlx::Error> {
    let withdrawal = sqlx::query_as(
        "INSERT INTO withdrawals (user_id, order_number, amount) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(withdrawal.user_id)
    .bind(withdrawal.order_number.as_str())
    .bind(withdrawal.amount)
    .fetch_one(conn)
    .await?;
    Ok(withdrawal)
}

/// Withdrawals for the user, newest first.
pub async fn fetch_withdrawals_for_user(user_id: i64, conn: &mut PgConnection) -> Result<Vec<Withdrawal>, sqlx::Error> {
    let withdrawals = sqlx::query_as("SELECT * FROM withdrawals WHERE user_id = $1 ORDER BY processed_at DESC, id DESC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(withdrawals)
}
