use std::future::Future;

use accrual_client::{AccrualApi, SettlementResult};
use thiserror::Error;

use crate::{
    db_types::{Order, SettlementUpdate},
    traits::SettlementApplied,
};

#[derive(Debug, Clone, Error)]
pub enum ReconciliationError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Crediting user #{0} would overflow their balance")]
    BalanceOverflow(i64),
}

impl ReconciliationError {
    /// Whether trying the same settlement again later can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ReconciliationError::DatabaseError(_))
    }
}

impl From<sqlx::Error> for ReconciliationError {
    fn from(e: sqlx::Error) -> Self {
        ReconciliationError::DatabaseError(e.to_string())
    }
}

/// The storage interface used by the order tracker's background task.
pub trait ReconciliationStore: Clone + Send + Sync + 'static {
    /// Every order that has not reached a terminal status, oldest first.
    fn fetch_pending_orders(&self) -> impl Future<Output = Result<Vec<Order>, ReconciliationError>> + Send;

    /// Applies a settlement to an order in a single transaction.
    ///
    /// The status is only written if it moves the order forward, so terminal orders are never touched again. If the
    /// order becomes `PROCESSED` with a reward, the owner's balance is credited in the same transaction: if the credit
    /// fails, the status change is rolled back too and the order stays pending.
    fn apply_settlement(
        &self,
        update: SettlementUpdate,
    ) -> impl Future<Output = Result<SettlementApplied, ReconciliationError>> + Send;
}

/// Anything that can answer "what is the settlement status of this order?"
pub trait SettlementSource: Send + Sync + 'static {
    fn fetch_settlement(&self, order_number: &str) -> impl Future<Output = SettlementResult> + Send;
}

impl SettlementSource for AccrualApi {
    async fn fetch_settlement(&self, order_number: &str) -> SettlementResult {
        AccrualApi::fetch_settlement(self, order_number).await
    }
}
