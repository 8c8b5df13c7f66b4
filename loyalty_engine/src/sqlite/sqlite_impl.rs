//! `SqliteDatabase` is a concrete implementation of a loyalty engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use log::*;
use lpg_common::Points;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};

use super::db::{balances, new_pool, orders, users, withdrawals};
use crate::{
    db_types::{
        Balance,
        NewOrder,
        NewUserAccount,
        NewWithdrawal,
        Order,
        OrderNumber,
        OrderStatusType,
        SettlementUpdate,
        UserAccount,
        Withdrawal,
    },
    traits::{
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
        UserManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let result = orders::idempotent_insert(order, &mut conn).await?;
        Ok(result)
    }

    async fn fetch_order(&self, number: &OrderNumber) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_number(number, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_user(user_id, &mut conn).await?;
        Ok(orders)
    }
}

impl BalanceManagement for SqliteDatabase {
    async fn fetch_balance(&self, user_id: i64) -> Result<Balance, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let balance = balances::fetch_balance(user_id, &mut conn).await?;
        Ok(balance.unwrap_or_else(|| Balance::empty(user_id)))
    }

    async fn credit_balance(&self, user_id: i64, amount: Points) -> Result<Balance, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let balance =
            balances::credit(user_id, amount, &mut conn).await?.ok_or(LedgerError::BalanceOverflow(user_id))?;
        debug!("🗃️ Credited {amount} to user #{user_id}. Available balance is now {}", balance.current);
        Ok(balance)
    }

    /// In a single atomic transaction,
    /// * moves the amount from the available balance to the withdrawn total, provided the available balance covers it,
    /// * records the withdrawal.
    ///
    /// If the balance is insufficient, the transaction is rolled back and nothing is recorded. A user without a balance
    /// row has a zero balance, so their withdrawals fail for insufficient funds.
    async fn debit_balance(&self, withdrawal: NewWithdrawal) -> Result<Withdrawal, LedgerError> {
        let user_id = withdrawal.user_id;
        let amount = withdrawal.amount;
        let mut tx = self.pool.begin().await?;
        if balances::debit(user_id, amount, &mut tx).await?.is_none() {
            let balance = balances::fetch_balance(user_id, &mut tx).await?;
            tx.rollback().await?;
            let available = balance.map(|b| b.current).unwrap_or_default();
            return Err(LedgerError::InsufficientFunds { available, requested: amount });
        }
        let withdrawal = withdrawals::insert_withdrawal(withdrawal, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗃️ Withdrawal #{} of {amount} against [{}] recorded for user #{user_id}",
            withdrawal.id, withdrawal.order_number
        );
        Ok(withdrawal)
    }

    async fn fetch_withdrawals(&self, user_id: i64) -> Result<Vec<Withdrawal>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let withdrawals = withdrawals::fetch_withdrawals_for_user(user_id, &mut conn).await?;
        Ok(withdrawals)
    }
}

impl UserManagement for SqliteDatabase {
    async fn create_user(&self, user: NewUserAccount) -> Result<UserAccount, AuthApiError> {
        let login = user.login.clone();
        let mut tx = self.pool.begin().await?;
        let user = match users::insert_user(user, &mut tx).await {
            Ok(user) => user,
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => return Err(AuthApiError::LoginTaken(login)),
            Err(e) => return Err(e.into()),
        };
        balances::create_balance(user.id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ User #{} ({}) created", user.id, user.login);
        Ok(user)
    }

    async fn fetch_user_by_login(&self, login: &str) -> Result<Option<UserAccount>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user_by_login(login, &mut conn).await?;
        Ok(user)
    }
}

impl ReconciliationStore for SqliteDatabase {
    async fn fetch_pending_orders(&self) -> Result<Vec<Order>, ReconciliationError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_pending_orders(&mut conn).await?;
        Ok(orders)
    }

    /// In a single atomic transaction,
    /// * advances the order's status, if the update moves it forward,
    /// * credits the reward, if any, to the order's owner.
    ///
    /// A failed credit rolls back the status change, so an order can never be `PROCESSED` without its reward.
    async fn apply_settlement(&self, update: SettlementUpdate) -> Result<SettlementApplied, ReconciliationError> {
        let mut tx = self.pool.begin().await?;
        let Some(order) = orders::advance_status(&update, &mut tx).await? else {
            let existing = orders::fetch_order_by_number(&update.number, &mut tx).await?;
            tx.rollback().await?;
            return Ok(existing.map(SettlementApplied::Unchanged).unwrap_or(SettlementApplied::NotFound));
        };
        let credited = match update.reward {
            Some(reward) if order.status == OrderStatusType::Processed => {
                let Some(balance) = balances::credit(order.user_id, reward, &mut tx).await? else {
                    tx.rollback().await?;
                    return Err(ReconciliationError::BalanceOverflow(order.user_id));
                };
                debug!(
                    "🗃️ Order [{}] earned {reward} for user #{}. Available balance is now {}",
                    order.number, order.user_id, balance.current
                );
                Some(reward)
            },
            _ => None,
        };
        tx.commit().await?;
        trace!("🗃️ Order [{}] is now {}", order.number, order.status);
        Ok(SettlementApplied::Updated { order, credited })
    }
}

impl LoyaltyDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    async fn close(&mut self) {
        self.pool.close().await;
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Creates the database file if it does not exist yet. Call this before [`Self::new_with_url`] when the database
    /// may be missing.
    pub async fn create_if_missing(url: &str) -> Result<bool, sqlx::Error> {
        if Sqlite::database_exists(url).await? {
            return Ok(false);
        }
        Sqlite::create_database(url).await?;
        info!("🗃️ Created Sqlite database {url}");
        Ok(true)
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
