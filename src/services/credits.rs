//! Credit ledger: every balance change goes through here and lands in the
//! append-only `credits_log` table together with its balance update.

use thiserror::Error;

use crate::db::Store;
use crate::entities::{credits_log, users};

pub const ACTION_ADMIN_ADD: &str = "admin_add";
pub const ACTION_ADMIN_REMOVE: &str = "admin_remove";
pub const ACTION_REFUND: &str = "refund";

#[derive(Debug, Error)]
pub enum CreditError {
    #[error("Insufficient credits")]
    InsufficientCredits,

    #[error("Account not found")]
    AccountNotFound,

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for CreditError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[derive(Clone)]
pub struct CreditService {
    store: Store,
}

impl CreditService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn balance(&self, account_id: i32) -> Result<i64, CreditError> {
        let account = self
            .store
            .get_account(account_id)
            .await?
            .ok_or(CreditError::AccountNotFound)?;
        Ok(account.credits)
    }

    /// Debits `amount` from the account, refusing (without any write) when
    /// the balance does not cover it.
    pub async fn debit(
        &self,
        account_id: i32,
        amount: i64,
        description: &str,
    ) -> Result<users::Model, CreditError> {
        match self
            .store
            .debit_credits(account_id, amount, description)
            .await?
        {
            Some(account) => Ok(account),
            // The conditional update matched nothing: either the account is
            // gone or the balance is short. Tell those apart for the caller.
            None => match self.store.get_account(account_id).await? {
                Some(_) => Err(CreditError::InsufficientCredits),
                None => Err(CreditError::AccountNotFound),
            },
        }
    }

    /// Returns a previously debited amount after a failed pipeline run.
    pub async fn refund(
        &self,
        account_id: i32,
        amount: i64,
        description: &str,
    ) -> Result<users::Model, CreditError> {
        self.store
            .apply_credits(account_id, amount, ACTION_REFUND, description)
            .await?
            .ok_or(CreditError::AccountNotFound)
    }

    /// Admin adjustment. No lower-bound check: removing more credits than an
    /// account holds is allowed and leaves a negative balance.
    pub async fn adjust(
        &self,
        account_id: i32,
        amount: i64,
        is_add: bool,
    ) -> Result<users::Model, CreditError> {
        let delta = if is_add { amount } else { -amount };
        let action_type = if is_add {
            ACTION_ADMIN_ADD
        } else {
            ACTION_ADMIN_REMOVE
        };
        let description = format!(
            "Admin {} {} credits",
            if is_add { "added" } else { "removed" },
            amount
        );

        self.store
            .apply_credits(account_id, delta, action_type, &description)
            .await?
            .ok_or(CreditError::AccountNotFound)
    }

    /// Ledger history, newest first, unbounded.
    pub async fn history(&self, account_id: i32) -> Result<Vec<credits_log::Model>, CreditError> {
        if self.store.get_account(account_id).await?.is_none() {
            return Err(CreditError::AccountNotFound);
        }
        Ok(self.store.credit_history(account_id).await?)
    }
}
