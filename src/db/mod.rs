use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::entities::{credits_log, users};
use crate::models::avatar::{Avatar, AvatarPatch};

pub mod migrator;
pub mod repositories;

pub use repositories::account::NewAccount;
pub use repositories::avatar::NewAvatar;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.starts_with(":memory:") && !db_url.contains("memory") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn account_repo(&self) -> repositories::account::AccountRepository {
        repositories::account::AccountRepository::new(self.conn.clone())
    }

    fn credit_repo(&self) -> repositories::credit::CreditRepository {
        repositories::credit::CreditRepository::new(self.conn.clone())
    }

    fn avatar_repo(&self) -> repositories::avatar::AvatarRepository {
        repositories::avatar::AvatarRepository::new(self.conn.clone())
    }

    // Accounts

    pub async fn get_account(&self, id: i32) -> Result<Option<users::Model>> {
        self.account_repo().get(id).await
    }

    pub async fn get_account_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<users::Model>> {
        self.account_repo().get_by_external_id(external_id).await
    }

    pub async fn create_account(&self, new: NewAccount) -> Result<users::Model> {
        self.account_repo().create(new).await
    }

    pub async fn refresh_account_identity(
        &self,
        id: i32,
        email: &str,
        is_authenticated: bool,
    ) -> Result<Option<users::Model>> {
        self.account_repo()
            .refresh_identity(id, email, is_authenticated)
            .await
    }

    pub async fn set_account_active(&self, id: i32, value: bool) -> Result<Option<users::Model>> {
        self.account_repo().set_active(id, value).await
    }

    pub async fn set_account_authenticated(
        &self,
        id: i32,
        value: bool,
    ) -> Result<Option<users::Model>> {
        self.account_repo().set_authenticated(id, value).await
    }

    pub async fn set_account_admin(&self, id: i32, value: bool) -> Result<Option<users::Model>> {
        self.account_repo().set_admin(id, value).await
    }

    pub async fn list_accounts(&self) -> Result<Vec<users::Model>> {
        self.account_repo().list().await
    }

    pub async fn delete_account_cascade(&self, id: i32) -> Result<bool> {
        self.account_repo().remove_cascade(id).await
    }

    // Credit ledger

    pub async fn debit_credits(
        &self,
        account_id: i32,
        amount: i64,
        description: &str,
    ) -> Result<Option<users::Model>> {
        self.credit_repo()
            .debit(account_id, amount, description)
            .await
    }

    pub async fn apply_credits(
        &self,
        account_id: i32,
        delta: i64,
        action_type: &str,
        description: &str,
    ) -> Result<Option<users::Model>> {
        self.credit_repo()
            .apply(account_id, delta, action_type, description)
            .await
    }

    pub async fn credit_history(&self, account_id: i32) -> Result<Vec<credits_log::Model>> {
        self.credit_repo().history(account_id).await
    }

    // Avatars

    pub async fn insert_avatar(&self, owner: &users::Model, new: NewAvatar) -> Result<Avatar> {
        self.avatar_repo().insert(owner, new).await
    }

    pub async fn get_avatar(&self, id: i32) -> Result<Option<Avatar>> {
        self.avatar_repo().get(id).await
    }

    pub async fn list_avatars(&self, account_id: i32) -> Result<Vec<Avatar>> {
        self.avatar_repo().list_for_account(account_id).await
    }

    pub async fn update_avatar(&self, id: i32, patch: AvatarPatch) -> Result<Option<Avatar>> {
        self.avatar_repo().update(id, patch).await
    }

    pub async fn set_avatar_image_url(&self, id: i32, image_url: &str) -> Result<Option<Avatar>> {
        self.avatar_repo().set_image_url(id, image_url).await
    }

    pub async fn delete_avatar(&self, id: i32) -> Result<bool> {
        self.avatar_repo().remove(id).await
    }
}
