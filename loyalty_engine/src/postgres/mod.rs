//! Postgres storage backend for the loyalty engine.
//!
//! Balance mutations take a row lock on the user's balance (`SELECT ... FOR UPDATE`), so withdrawals and credits for
//! one user are serialised while different users proceed in parallel.
mod postgres_impl;

pub mod db;
pub use postgres_impl::PostgresDatabase;
