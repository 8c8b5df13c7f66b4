//! The balance ledger.
//!
//! Every balance mutation goes through here, whether it is a user withdrawing points or the order tracker crediting a
//! reward.
use std::fmt::Debug;

use log::*;
use lpg_common::Points;

use crate::{
    db_types::{Balance, NewWithdrawal, OrderNumber, Withdrawal},
    helpers::is_valid_order_number,
    traits::{BalanceManagement, LedgerError},
};

pub struct LedgerApi<B> {
    db: B,
}

impl<B: Debug> Debug for LedgerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LedgerApi ({:?})", self.db)
    }
}

impl<B> LedgerApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> LedgerApi<B>
where B: BalanceManagement
{
    /// Adds `amount` to the user's available balance.
    ///
    /// Crediting zero or a negative amount is a caller bug. It is logged and ignored, and the balance is returned
    /// unchanged.
    pub async fn credit(&self, user_id: i64, amount: Points) -> Result<Balance, LedgerError> {
        debug_assert!(amount.is_positive(), "credits must be positive");
        if !amount.is_positive() {
            error!("💰️ Refusing to credit a non-positive amount ({amount}) to user #{user_id}");
            return self.db.fetch_balance(user_id).await;
        }
        self.db.credit_balance(user_id, amount).await
    }

    /// Withdraws `amount` from the user's balance against the reference `order_ref`.
    ///
    /// The reference must pass the Luhn check and the amount must be positive. These are checked before the database
    /// is touched. The withdrawal fails with [`LedgerError::InsufficientFunds`] if the available balance does not cover
    /// it, in which case nothing changes.
    pub async fn debit(&self, user_id: i64, order_ref: &str, amount: Points) -> Result<Withdrawal, LedgerError> {
        if !is_valid_order_number(order_ref) {
            return Err(LedgerError::InvalidReference(order_ref.to_string()));
        }
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let withdrawal = NewWithdrawal::new(user_id, OrderNumber::from(order_ref), amount);
        match self.db.debit_balance(withdrawal).await {
            Ok(w) => {
                info!("💰️ User #{user_id} withdrew {amount} against [{order_ref}]");
                Ok(w)
            },
            Err(e) => {
                debug!("💰️ Withdrawal of {amount} by user #{user_id} failed. {e}");
                Err(e)
            },
        }
    }

    /// The user's balance. Users without any ledger history have a zero balance.
    pub async fn read(&self, user_id: i64) -> Result<Balance, LedgerError> {
        self.db.fetch_balance(user_id).await
    }

    /// The user's withdrawals, newest first.
    pub async fn withdrawals(&self, user_id: i64) -> Result<Vec<Withdrawal>, LedgerError> {
        self.db.fetch_withdrawals(user_id).await
    }
}
