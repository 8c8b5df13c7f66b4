//! #  Storage contracts.
//!
//! This module defines the behaviour a storage backend must expose in order to back the loyalty engine.
//!
//! * [`OrderManagement`] stores submitted orders and answers queries about them.
//! * [`BalanceManagement`] is the ledger primitive layer: balances and the withdrawals that drain them. Every mutation
//!   must be atomic with respect to other mutations of the same user's balance.
//! * [`UserManagement`] stores user accounts (and creates their empty balance alongside them).
//! * [`ReconciliationStore`] is the narrow interface the order tracker uses from its background task. Its futures are
//!   `Send`, so that the tracker can be spawned onto a multithreaded runtime.
//! * [`SettlementSource`] is the tracker's view of the accrual system.
//!
//! [`LoyaltyDatabase`] bundles the storage traits together with connection and schema management. The server is
//! generic over it, so it can run against any backend.
mod balance_management;
mod loyalty_database;
mod order_management;
mod reconciliation;
mod user_management;

mod data_objects;

pub use balance_management::{BalanceManagement, LedgerError};
pub use data_objects::{InsertOrderResult, SettlementApplied};
pub use loyalty_database::LoyaltyDatabase;
pub use order_management::{OrderFlowError, OrderManagement};
pub use reconciliation::{ReconciliationError, ReconciliationStore, SettlementSource};
pub use user_management::{AuthApiError, UserManagement};
