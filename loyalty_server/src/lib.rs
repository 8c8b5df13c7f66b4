//! # Loyalty points server
//! This crate hosts the HTTP front end of the loyalty points gateway. It is responsible for:
//! * Registering users and issuing signed session cookies.
//! * Accepting order numbers from authenticated users and handing them to the reconciliation worker.
//! * Serving order history, balances and withdrawals, and accepting withdrawal requests.
//!
//! ## Configuration
//! The server is configured via command-line flags and environment variables. See [config](config/index.html) for
//! more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/user/register` and `/api/user/login`: Create an account or log in. Both set the `auth_token` cookie.
//! * `/api/user/orders`: Submit an order number (`POST`) or list your orders (`GET`).
//! * `/api/user/balance`: Your current balance and total withdrawn.
//! * `/api/user/balance/withdraw`: Spend points against an order number.
//! * `/api/user/withdrawals`: Your withdrawal history.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;

pub mod helpers;
pub mod reconciliation_worker;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
