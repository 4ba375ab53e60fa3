//! Privileged operations. Every entry point re-checks the caller's admin
//! flag even though the HTTP layer already gates admin routes.

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::config::AccessConfig;
use crate::db::{NewAccount, Store};
use crate::entities::{credits_log, users};
use crate::services::credits::{CreditError, CreditService};

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Account not found")]
    NotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for AdminError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<CreditError> for AdminError {
    fn from(err: CreditError) -> Self {
        match err {
            CreditError::AccountNotFound => Self::NotFound,
            // The admin adjust path is unchecked; a refusal here can only be
            // a plumbing problem.
            CreditError::InsufficientCredits => {
                Self::Database("unexpected balance refusal on admin adjustment".to_string())
            }
            CreditError::Database(message) => Self::Database(message),
        }
    }
}

#[derive(Clone)]
pub struct AdminService {
    store: Store,
    credits: CreditService,
    access: AccessConfig,
}

impl AdminService {
    #[must_use]
    pub const fn new(store: Store, credits: CreditService, access: AccessConfig) -> Self {
        Self {
            store,
            credits,
            access,
        }
    }

    fn ensure_admin(caller: &users::Model) -> Result<(), AdminError> {
        if caller.is_admin {
            Ok(())
        } else {
            Err(AdminError::Unauthorized)
        }
    }

    pub async fn list_accounts(&self, caller: &users::Model) -> Result<Vec<users::Model>, AdminError> {
        Self::ensure_admin(caller)?;
        Ok(self.store.list_accounts().await?)
    }

    pub async fn adjust_credits(
        &self,
        caller: &users::Model,
        account_id: i32,
        amount: i64,
        is_add: bool,
    ) -> Result<users::Model, AdminError> {
        Self::ensure_admin(caller)?;

        if amount <= 0 {
            return Err(AdminError::Validation(
                "Adjustment amount must be positive".to_string(),
            ));
        }

        let account = self.credits.adjust(account_id, amount, is_add).await?;
        info!(
            admin = caller.id,
            account_id,
            amount,
            is_add,
            "Adjusted credits"
        );
        Ok(account)
    }

    pub async fn credit_history(
        &self,
        caller: &users::Model,
        account_id: i32,
    ) -> Result<Vec<credits_log::Model>, AdminError> {
        Self::ensure_admin(caller)?;
        Ok(self.credits.history(account_id).await?)
    }

    pub async fn set_active(
        &self,
        caller: &users::Model,
        account_id: i32,
        value: bool,
    ) -> Result<users::Model, AdminError> {
        Self::ensure_admin(caller)?;
        self.store
            .set_account_active(account_id, value)
            .await?
            .ok_or(AdminError::NotFound)
    }

    pub async fn set_authenticated(
        &self,
        caller: &users::Model,
        account_id: i32,
        value: bool,
    ) -> Result<users::Model, AdminError> {
        Self::ensure_admin(caller)?;
        self.store
            .set_account_authenticated(account_id, value)
            .await?
            .ok_or(AdminError::NotFound)
    }

    /// Granting or revoking admin rights is restricted beyond the admin flag:
    /// only the configured super-admin may do it, enforced here at the
    /// operation boundary rather than in any UI.
    pub async fn set_admin(
        &self,
        caller: &users::Model,
        account_id: i32,
        value: bool,
    ) -> Result<users::Model, AdminError> {
        Self::ensure_admin(caller)?;

        if !self.access.is_super_admin_email(&caller.email) {
            return Err(AdminError::Unauthorized);
        }

        let account = self
            .store
            .set_account_admin(account_id, value)
            .await?
            .ok_or(AdminError::NotFound)?;

        info!(
            admin = caller.id,
            account_id, value, "Changed admin flag"
        );
        Ok(account)
    }

    /// Creates one pre-activated account per email with a synthetic external
    /// id. Imported accounts bypass approval but are not authenticated until
    /// their owner signs in.
    pub async fn bulk_create(
        &self,
        caller: &users::Model,
        emails: &[String],
        default_credits: i64,
    ) -> Result<Vec<users::Model>, AdminError> {
        Self::ensure_admin(caller)?;

        if emails.is_empty() {
            return Err(AdminError::Validation("No emails provided".to_string()));
        }

        let mut created = Vec::with_capacity(emails.len());
        for email in emails {
            let email = email.trim();
            if email.is_empty() {
                continue;
            }

            let account = self
                .store
                .create_account(NewAccount {
                    external_id: format!("import-{}", Uuid::new_v4()),
                    email: email.to_string(),
                    credits: default_credits,
                    is_active: true,
                    is_authenticated: false,
                    is_admin: false,
                })
                .await?;
            created.push(account);
        }

        info!(admin = caller.id, count = created.len(), "Bulk-created accounts");
        Ok(created)
    }

    /// CSV import: one email per line, anything without an `@` is skipped.
    pub async fn import_accounts_csv(
        &self,
        caller: &users::Model,
        content: &str,
        default_credits: i64,
    ) -> Result<Vec<users::Model>, AdminError> {
        Self::ensure_admin(caller)?;

        let emails: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| line.contains('@'))
            .map(ToString::to_string)
            .collect();

        if emails.is_empty() {
            return Err(AdminError::Validation(
                "No email addresses found in the uploaded file".to_string(),
            ));
        }

        self.bulk_create(caller, &emails, default_credits).await
    }

    /// All-or-nothing cascade: avatars, ledger rows, then the account.
    pub async fn delete_account(
        &self,
        caller: &users::Model,
        account_id: i32,
    ) -> Result<(), AdminError> {
        Self::ensure_admin(caller)?;

        if self.store.delete_account_cascade(account_id).await? {
            Ok(())
        } else {
            Err(AdminError::NotFound)
        }
    }
}
