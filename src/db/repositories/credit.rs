use anyhow::Result;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use crate::entities::{credits_log, prelude::*, users};

pub struct CreditRepository {
    conn: DatabaseConnection,
}

impl CreditRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Debits `amount` iff the balance covers it, using a single conditional
    /// `UPDATE ... WHERE credits >= amount` so two concurrent debits cannot
    /// drive the balance negative. The balance change and its audit row
    /// commit in the same transaction.
    ///
    /// Returns `None` when the conditional update matched no row (account
    /// missing or balance too low); nothing is written in that case.
    pub async fn debit(
        &self,
        account_id: i32,
        amount: i64,
        description: &str,
    ) -> Result<Option<users::Model>> {
        let txn = self.conn.begin().await?;

        let result = Users::update_many()
            .col_expr(
                users::Column::Credits,
                Expr::col(users::Column::Credits).sub(amount),
            )
            .col_expr(
                users::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .filter(users::Column::Id.eq(account_id))
            .filter(users::Column::Credits.gte(amount))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Ok(None);
        }

        let Some(account) = Users::find_by_id(account_id).one(&txn).await? else {
            txn.rollback().await?;
            return Ok(None);
        };

        Self::append_log(&txn, &account, -amount, "deduct", description).await?;

        txn.commit().await?;
        Ok(Some(account))
    }

    /// Applies an unconditional signed balance change with its audit row.
    /// Used by the admin adjust path (which may force a negative balance)
    /// and by pipeline refunds. Returns `None` when the account is missing.
    pub async fn apply(
        &self,
        account_id: i32,
        delta: i64,
        action_type: &str,
        description: &str,
    ) -> Result<Option<users::Model>> {
        let txn = self.conn.begin().await?;

        let Some(account) = Users::find_by_id(account_id).one(&txn).await? else {
            txn.rollback().await?;
            return Ok(None);
        };

        let new_balance = account.credits + delta;

        let mut active: users::ActiveModel = account.into();
        active.credits = Set(new_balance);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        let updated = active.update(&txn).await?;

        Self::append_log(&txn, &updated, delta, action_type, description).await?;

        txn.commit().await?;
        Ok(Some(updated))
    }

    /// Full ledger history for an account, newest first.
    pub async fn history(&self, account_id: i32) -> Result<Vec<credits_log::Model>> {
        let entries = CreditsLog::find()
            .filter(credits_log::Column::AccountId.eq(account_id))
            .order_by_desc(credits_log::Column::CreatedAt)
            .order_by_desc(credits_log::Column::Id)
            .all(&self.conn)
            .await?;
        Ok(entries)
    }

    async fn append_log<C: ConnectionTrait>(
        conn: &C,
        account: &users::Model,
        amount: i64,
        action_type: &str,
        description: &str,
    ) -> Result<()> {
        let entry = credits_log::ActiveModel {
            account_id: Set(account.id),
            external_id: Set(account.external_id.clone()),
            amount: Set(amount),
            action_type: Set(action_type.to_string()),
            description: Set(description.to_string()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        CreditsLog::insert(entry).exec(conn).await?;
        Ok(())
    }
}
