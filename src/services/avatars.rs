//! CRUD over saved avatars, scoped to the owning account. Non-owners get
//! `NotFound` rather than a hint that the id exists.

use thiserror::Error;

use crate::db::Store;
use crate::entities::users;
use crate::models::avatar::{Avatar, AvatarPatch};

#[derive(Debug, Error)]
pub enum AvatarError {
    #[error("Avatar not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for AvatarError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[derive(Clone)]
pub struct AvatarService {
    store: Store,
}

impl AvatarService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// All avatars owned by the account, newest first, unbounded.
    pub async fn list(&self, account_id: i32) -> Result<Vec<Avatar>, AvatarError> {
        Ok(self.store.list_avatars(account_id).await?)
    }

    pub async fn get(&self, caller: &users::Model, avatar_id: i32) -> Result<Avatar, AvatarError> {
        let avatar = self
            .store
            .get_avatar(avatar_id)
            .await?
            .ok_or(AvatarError::NotFound)?;

        if avatar.account_id != caller.id && !caller.is_admin {
            return Err(AvatarError::NotFound);
        }

        Ok(avatar)
    }

    /// Whole-field overwrite of the provided sections; last writer wins, no
    /// concurrency token.
    pub async fn update(
        &self,
        caller: &users::Model,
        avatar_id: i32,
        patch: AvatarPatch,
    ) -> Result<Avatar, AvatarError> {
        self.get(caller, avatar_id).await?;

        self.store
            .update_avatar(avatar_id, patch)
            .await?
            .ok_or(AvatarError::NotFound)
    }

    /// Removes the avatar row only. Ledger history stays, and the credit
    /// originally spent is not returned.
    pub async fn delete(&self, caller: &users::Model, avatar_id: i32) -> Result<(), AvatarError> {
        self.get(caller, avatar_id).await?;

        if self.store.delete_avatar(avatar_id).await? {
            Ok(())
        } else {
            Err(AvatarError::NotFound)
        }
    }
}
