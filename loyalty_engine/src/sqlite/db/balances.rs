use lpg_common::Points;
use sqlx::SqliteConnection;

use crate::db_types::Balance;

/// Creates a zero balance for a new user.
pub async fn create_balance(user_id: i64, conn: &mut SqliteConnection) -> Result<Balance, sqlx::Error> {
    let balance = sqlx::query_as("INSERT INTO balances (user_id) VALUES ($1) RETURNING user_id, available, withdrawn")
        .bind(user_id)
        .fetch_one(conn)
        .await?;
    Ok(balance)
}

pub async fn fetch_balance(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<Balance>, sqlx::Error> {
    let balance = sqlx::query_as("SELECT user_id, available, withdrawn FROM balances WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(balance)
}

/// Adds a positive `amount` to the user's available balance in a single statement, creating the balance row if it is
/// missing. Returns `None`, and changes nothing, if the new balance would not fit in 64 bits. SQLite would otherwise
/// silently turn the sum into a REAL.
pub async fn credit(user_id: i64, amount: Points, conn: &mut SqliteConnection) -> Result<Option<Balance>, sqlx::Error> {
    let balance = sqlx::query_as(
        r#"
            INSERT INTO balances (user_id, available) VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET
                available = available + excluded.available,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            WHERE available <= 9223372036854775807 - excluded.available
            RETURNING user_id, available, withdrawn;
        "#,
    )
    .bind(user_id)
    .bind(amount)
    .fetch_optional(conn)
    .await?;
    Ok(balance)
}

/// Moves `amount` from the available balance to the withdrawn total, if and only if the available balance covers it.
/// The check and the update are one statement. Returns `None` if nothing was changed, either because the funds are
/// insufficient or because the user has no balance.
pub async fn debit(user_id: i64, amount: Points, conn: &mut SqliteConnection) -> Result<Option<Balance>, sqlx::Error> {
    let balance = sqlx::query_as(
        r#"
            UPDATE balances SET
                available = available - $1,
                withdrawn = withdrawn + $1,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            WHERE user_id = $2 AND available >= $1
            RETURNING user_id, available, withdrawn;
        "#,
    )
    .bind(amount)
    .bind(user_id)
    .fetch_optional(conn)
    .await?;
    Ok(balance)
}
