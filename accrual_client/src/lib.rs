//! Client for the accrual authority, the external service that decides how many loyalty points an order earns.
//!
//! Every call resolves to a [`SettlementResult`]; transport failures are folded into
//! [`SettlementResult::Fatal`] rather than returned as errors, so callers only ever branch on the tag.
mod api;
mod config;
mod error;

mod data_objects;

pub use api::AccrualApi;
pub use config::AccrualConfig;
pub use data_objects::{AccrualStatus, Settlement, SettlementResult};
pub use error::AccrualApiError;
