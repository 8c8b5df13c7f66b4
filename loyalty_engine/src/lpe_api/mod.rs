//! # Loyalty engine public API
//!
//! The `lpe_api` module exposes the programmatic API of the loyalty engine. The HTTP server talks to the engine through
//! these types only.
//!
//! * [`order_flow_api`] validates and stores submitted orders, and hands them to the order tracker.
//! * [`ledger_api`] is the balance ledger: credits, withdrawals and balance inquiries.
//! * [`auth_api`] registers users and checks their credentials.
//!
//! # API usage
//!
//! An API instance is created by supplying a database backend that implements the backend traits required by the API.
//!
//! ```rust,ignore
//! use loyalty_engine::{LedgerApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements BalanceManagement
//! let api = LedgerApi::new(db);
//! let balance = api.read(user_id).await?;
//! ```

pub mod auth_api;
pub mod ledger_api;
pub mod order_flow_api;
