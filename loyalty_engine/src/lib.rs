//! Loyalty Engine
//!
//! The loyalty engine tracks the orders customers submit for loyalty points, asks the external accrual system how many
//! points each order earns, and keeps every user's points balance.
//!
//! The library is divided into these main sections:
//! 1. Storage ([`mod@traits`], `SqliteDatabase` and `PostgresDatabase`). The traits define what a storage backend must
//!    provide. SQLite suits single-node deployments. Postgres locks balances per user, so withdrawals by different
//!    users run in parallel. The data types used in storage are defined in [`mod@db_types`] and are public.
//! 2. The engine public API ([`mod@lpe_api`]): order submission, the balance ledger and user accounts.
//! 3. The order tracker ([`mod@tracker`]): the background task that reconciles pending orders against the accrual
//!    system and credits rewards exactly once.
pub mod db_types;
pub mod helpers;
mod lpe_api;
#[cfg(feature = "postgres")]
mod postgres;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod tracker;
pub mod traits;

#[cfg(all(any(feature = "test_utils", test), feature = "sqlite"))]
pub mod test_utils;

#[cfg(feature = "postgres")]
pub use postgres::PostgresDatabase;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use lpe_api::{
    auth_api::AuthApi,
    ledger_api::LedgerApi,
    order_flow_api::{OrderFlowApi, SubmitOrderResult},
};
pub use tracker::{OrderIntake, OrderTracker, TrackerConfig, TrackerHandle};
pub use traits::{
    AuthApiError,
    BalanceManagement,
    InsertOrderResult,
    LedgerError,
    LoyaltyDatabase,
    OrderFlowError,
    OrderManagement,
    ReconciliationError,
    ReconciliationStore,
    SettlementApplied,
    SettlementSource,
    UserManagement,
};
