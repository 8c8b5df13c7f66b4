use lpg_common::Points;
use thiserror::Error;

use crate::db_types::{Balance, NewWithdrawal, Withdrawal};

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("{0} is not a valid withdrawal reference")]
    InvalidReference(String),
    #[error("Withdrawal amounts must be positive. {0} is not")]
    InvalidAmount(Points),
    #[error("Insufficient funds. {requested} was requested, but only {available} is available")]
    InsufficientFunds { available: Points, requested: Points },
    #[error("Crediting user #{0} would overflow their balance")]
    BalanceOverflow(i64),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}

/// Ledger primitives.
///
/// Implementations must make every mutating call atomic and serialised against every other mutation of the same
/// user's balance: a debit's sufficiency check and its decrement may not be separated by a concurrent credit or debit.
#[allow(async_fn_in_trait)]
pub trait BalanceManagement {
    /// Returns the user's balance, or a zero balance if none has been recorded yet.
    async fn fetch_balance(&self, user_id: i64) -> Result<Balance, LedgerError>;

    /// Atomically adds `amount` to the user's current balance and returns the new balance.
    async fn credit_balance(&self, user_id: i64, amount: Points) -> Result<Balance, LedgerError>;

    /// Atomically checks that the balance covers the withdrawal, then moves the amount from `current` to `withdrawn`
    /// and records the withdrawal. Either all of this happens, or none of it does.
    async fn debit_balance(&self, withdrawal: NewWithdrawal) -> Result<Withdrawal, LedgerError>;

    /// All withdrawals made by the user, newest first.
    async fn fetch_withdrawals(&self, user_id: i64) -> Result<Vec<Withdrawal>, LedgerError>;
}
