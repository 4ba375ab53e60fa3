use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::info;

use crate::entities::{avatars, credits_log, prelude::*, users};

/// Field set for a new account row.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub external_id: String,
    pub email: String,
    pub credits: i64,
    pub is_active: bool,
    pub is_authenticated: bool,
    pub is_admin: bool,
}

pub struct AccountRepository {
    conn: DatabaseConnection,
}

impl AccountRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: i32) -> Result<Option<users::Model>> {
        let account = Users::find_by_id(id).one(&self.conn).await?;
        Ok(account)
    }

    pub async fn get_by_external_id(&self, external_id: &str) -> Result<Option<users::Model>> {
        let account = Users::find()
            .filter(users::Column::ExternalId.eq(external_id))
            .one(&self.conn)
            .await?;
        Ok(account)
    }

    /// Inserts a new account. A uniqueness conflict on `external_id` surfaces
    /// as an error; the provisioning layer resolves that by re-fetching.
    pub async fn create(&self, new: NewAccount) -> Result<users::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = users::ActiveModel {
            external_id: Set(new.external_id),
            email: Set(new.email),
            credits: Set(new.credits),
            is_active: Set(new.is_active),
            is_authenticated: Set(new.is_authenticated),
            is_admin: Set(new.is_admin),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active.insert(&self.conn).await?;
        Ok(model)
    }

    /// Refreshes the stored email and authentication flag during
    /// re-provisioning (admin emails are auto-authenticated).
    pub async fn refresh_identity(
        &self,
        id: i32,
        email: &str,
        is_authenticated: bool,
    ) -> Result<Option<users::Model>> {
        let Some(account) = Users::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = account.into();
        active.email = Set(email.to_string());
        active.is_authenticated = Set(is_authenticated);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let updated = active.update(&self.conn).await?;
        Ok(Some(updated))
    }

    pub async fn set_active(&self, id: i32, value: bool) -> Result<Option<users::Model>> {
        self.set_flag(id, users::Column::IsActive, value).await
    }

    pub async fn set_authenticated(&self, id: i32, value: bool) -> Result<Option<users::Model>> {
        self.set_flag(id, users::Column::IsAuthenticated, value)
            .await
    }

    pub async fn set_admin(&self, id: i32, value: bool) -> Result<Option<users::Model>> {
        self.set_flag(id, users::Column::IsAdmin, value).await
    }

    async fn set_flag(
        &self,
        id: i32,
        column: users::Column,
        value: bool,
    ) -> Result<Option<users::Model>> {
        let Some(account) = Users::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = account.into();
        match column {
            users::Column::IsActive => active.is_active = Set(value),
            users::Column::IsAuthenticated => active.is_authenticated = Set(value),
            users::Column::IsAdmin => active.is_admin = Set(value),
            _ => anyhow::bail!("Not a toggleable account flag: {column:?}"),
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let updated = active.update(&self.conn).await?;
        Ok(Some(updated))
    }

    pub async fn list(&self) -> Result<Vec<users::Model>> {
        let accounts = Users::find()
            .order_by_desc(users::Column::CreatedAt)
            .all(&self.conn)
            .await?;
        Ok(accounts)
    }

    /// Deletes an account together with its avatars and ledger rows in one
    /// transaction, so a mid-cascade failure leaves nothing half-deleted.
    pub async fn remove_cascade(&self, id: i32) -> Result<bool> {
        let txn = self.conn.begin().await?;

        avatars::Entity::delete_many()
            .filter(avatars::Column::AccountId.eq(id))
            .exec(&txn)
            .await?;

        credits_log::Entity::delete_many()
            .filter(credits_log::Column::AccountId.eq(id))
            .exec(&txn)
            .await?;

        let result = Users::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;

        let removed = result.rows_affected > 0;
        if removed {
            info!("Deleted account {} with avatars and credit history", id);
        }
        Ok(removed)
    }
}
