use std::fmt::Debug;

use crate::traits::{BalanceManagement, OrderManagement, ReconciliationStore, UserManagement};

/// Everything the gateway needs from a storage backend, plus its lifecycle.
///
/// Backends must serialise balance mutations per user, but mutations of different users' balances should not wait on
/// each other.
#[allow(async_fn_in_trait)]
pub trait LoyaltyDatabase:
    OrderManagement + BalanceManagement + UserManagement + ReconciliationStore + Debug
{
    /// The URL of the database
    fn url(&self) -> &str;

    /// Brings the schema up to date.
    async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError>;

    /// Closes every connection in the pool.
    async fn close(&mut self);
}
