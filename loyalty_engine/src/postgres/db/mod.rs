//! # Postgres Database methods
//!
//! Like their SQLite counterparts, these are plain functions that take a `&mut PgConnection`, so they can run against
//! a pooled connection or inside a transaction.
//!
//! Functions that read a row in order to change it take a row lock first. The lock is held until the surrounding
//! transaction ends, so they must be called inside one.
use sqlx::{postgres::PgPoolOptions, Error as SqlxError, PgPool};

pub mod balances;
pub mod orders;
pub mod users;
pub mod withdrawals;

pub async fn new_pool(url: &str, max_connections: u32) -> Result<PgPool, SqlxError> {
    let pool = PgPoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}
