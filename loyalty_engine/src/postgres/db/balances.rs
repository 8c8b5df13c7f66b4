use lpg_common::Points;
use sqlx::PgConnection;

use crate::db_types::Balance;

/// Creates a zero balance for a new user.
pub async fn create_balance(user_id: i64, conn: &mut PgConnection) -> Result<Balance, sqlx::Error> {
    let balance = sqlx::query_as("INSERT INTO balances (user_id) VALUES ($1) RETURNING user_id, available, withdrawn")
        .bind(user_id)
        .fetch_one(conn)
        .await?;
    Ok(balance)
}

pub async fn fetch_balance(user_id: i64, conn: &mut PgConnection) -> Result<Option<Balance>, sqlx::Error> {
    let balance = sqlx::query_as("SELECT user_id, available, withdrawn FROM balances WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(balance)
}

/// Reads the user's balance and locks the row until the transaction ends.
pub async fn lock_balance(user_id: i64, conn: &mut PgConnection) -> Result<Option<Balance>, sqlx::Error> {
    let balance = sqlx::query_as("SELECT user_id, available, withdrawn FROM balances WHERE user_id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(balance)
}

/// Like [`lock_balance`], but creates a zero balance first if the user has none.
pub async fn lock_or_create_balance(user_id: i64, conn: &mut PgConnection) -> Result<Balance, sqlx::Error> {
    sqlx::query("INSERT INTO balances (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    lock_balance(user_id, conn).await?.ok_or(sqlx::Error::RowNotFound)
}

pub async fn update_balance(
    user_id: i64,
    available: Points,
    withdrawn: Points,
    conn: &mut PgConnection,
) -> Result<Balance, sqlx::Error> {
    let balance = sqlx::query_as(
        r#"
            UPDATE balances SET available = $1, withdrawn = $2, updated_at = now()
            WHERE user_id = $3
            RETURNING user_id, available, withdrawn;
        "#,
    )
    .bind(available)
    .bind(withdrawn)
    .bind(user_id)
    .fetch_one(conn)
    .await?;
    Ok(balance)
}
