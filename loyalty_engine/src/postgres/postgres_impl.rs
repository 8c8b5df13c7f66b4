//! `PostgresDatabase` is the loyalty engine backend for deployments with more than a handful of concurrent users.
//!
//! SQLite serialises every write transaction in the database. Here each balance mutation locks only the affected
//! user's balance row, so one user's withdrawal never waits on another's.
use std::fmt::Debug;

use log::*;
use lpg_common::Points;
use sqlx::{migrate::MigrateDatabase, PgPool, Postgres};

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
pub struct PostgresDatabase {
    url: String,
    pool: PgPool,
}

impl Debug for PostgresDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "PostgresDatabase ({:?})", self.pool)
    }
}

impl OrderManagement for PostgresDatabase {
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

impl BalanceManagement for PostgresDatabase {
    async fn fetch_balance(&self, user_id: i64) -> Result<Balance, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let balance = balances::fetch_balance(user_id, &mut conn).await?;
        Ok(balance.unwrap_or_else(|| Balance::empty(user_id)))
    }

    async fn credit_balance(&self, user_id: i64, amount: Points) -> Result<Balance, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let balance = balances::lock_or_create_balance(user_id, &mut tx).await?;
        let Some(available) = balance.current.checked_add(amount) else {
            tx.rollback().await?;
            return Err(LedgerError::BalanceOverflow(user_id));
        };
        let balance = balances::update_balance(user_id, available, balance.withdrawn, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Credited {amount} to user #{user_id}. Available balance is now {}", balance.current);
        Ok(balance)
    }

    /// In a single transaction, holding the lock on the user's balance row,
    /// * checks that the available balance covers the amount,
    /// * moves the amount from the available balance to the withdrawn total,
    /// * records the withdrawal.
    ///
    /// If the balance is insufficient, the transaction is rolled back and nothing is recorded. A user without a balance
    /// row has a zero balance, so their withdrawals fail for insufficient funds.
    async fn debit_balance(&self, withdrawal: NewWithdrawal) -> Result<Withdrawal, LedgerError> {
        let user_id = withdrawal.user_id;
        let amount = withdrawal.amount;
        let mut tx = self.pool.begin().await?;
        let balance = balances::lock_balance(user_id, &mut tx).await?.unwrap_or_else(|| Balance::empty(user_id));
        if balance.current < amount {
            tx.rollback().await?;
            return Err(LedgerError::InsufficientFunds { available: balance.current, requested: amount });
        }
        let available = balance.current - amount;
        let Some(withdrawn) = balance.withdrawn.checked_add(amount) else {
            tx.rollback().await?;
            return Err(LedgerError::BalanceOverflow(user_id));
        };
        balances::update_balance(user_id, available, withdrawn, &mut tx).await?;
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

impl UserManagement for PostgresDatabase {
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

impl ReconciliationStore for PostgresDatabase {
    async fn fetch_pending_orders(&self) -> Result<Vec<Order>, ReconciliationError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_pending_orders(&mut conn).await?;
        Ok(orders)
    }

    /// In a single transaction, holding the lock on the order row,
    /// * advances the order's status, if the update moves it forward,
    /// * credits the reward, if any, to the order's owner, holding the lock on their balance row.
    ///
    /// A failed credit rolls back the status change, so an order can never be `PROCESSED` without its reward.
    async fn apply_settlement(&self, update: SettlementUpdate) -> Result<SettlementApplied, ReconciliationError> {
        let mut tx = self.pool.begin().await?;
        let Some(existing) = orders::lock_order(&update.number, &mut tx).await? else {
            tx.rollback().await?;
            return Ok(SettlementApplied::NotFound);
        };
        if !existing.status.can_advance_to(update.status) {
            tx.rollback().await?;
            return Ok(SettlementApplied::Unchanged(existing));
        }
        let order = orders::set_status(&update, &mut tx).await?;
        let credited = match update.reward {
            Some(reward) if order.status == OrderStatusType::Processed => {
                let balance = balances::lock_or_create_balance(order.user_id, &mut tx).await?;
                let Some(available) = balance.current.checked_add(reward) else {
                    tx.rollback().await?;
                    return Err(ReconciliationError::BalanceOverflow(order.user_id));
                };
                let balance = balances::update_balance(order.user_id, available, balance.withdrawn, &mut tx).await?;
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

impl LoyaltyDatabase for PostgresDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/postgres/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    async fn close(&mut self) {
        self.pool.close().await;
    }
}

impl PostgresDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Creates the database if the server does not have it yet. The server itself must already be running.
    pub async fn create_if_missing(url: &str) -> Result<bool, sqlx::Error> {
        if Postgres::database_exists(url).await? {
            return Ok(false);
        }
        Postgres::create_database(url).await?;
        info!("🗃️ Created Postgres database {url}");
        Ok(true)
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
