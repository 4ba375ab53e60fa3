//! Lazily provisions an account the first time an authenticated identity
//! shows up, and keeps its email/authentication state in sync afterwards.

use anyhow::Result;
use tracing::{debug, info};

use crate::config::AccessConfig;
use crate::db::{NewAccount, Store};
use crate::entities::users;

#[derive(Clone)]
pub struct ProvisioningService {
    store: Store,
    access: AccessConfig,
}

impl ProvisioningService {
    #[must_use]
    pub const fn new(store: Store, access: AccessConfig) -> Self {
        Self { store, access }
    }

    /// Ensures exactly one account exists for this external identity and
    /// returns it. Calling this twice with identical inputs is a no-op on
    /// the second call.
    pub async fn ensure_account(&self, external_id: &str, email: &str) -> Result<users::Model> {
        let is_admin = self.access.is_admin_email(email);

        if let Some(existing) = self.store.get_account_by_external_id(external_id).await? {
            // Refresh a stale email, and auto-authenticate admin addresses
            // that signed up before landing on the allow-list.
            if existing.email != email || (is_admin && !existing.is_authenticated) {
                let authenticated = is_admin || existing.is_authenticated;
                if let Some(updated) = self
                    .store
                    .refresh_account_identity(existing.id, email, authenticated)
                    .await?
                {
                    debug!(account_id = updated.id, "Refreshed account identity");
                    return Ok(updated);
                }
            }
            return Ok(existing);
        }

        let new = NewAccount {
            external_id: external_id.to_string(),
            email: email.to_string(),
            credits: self.access.starting_credits,
            is_active: is_admin,
            is_authenticated: is_admin,
            is_admin,
        };

        match self.store.create_account(new).await {
            Ok(created) => {
                info!(
                    account_id = created.id,
                    admin = is_admin,
                    "Provisioned new account"
                );
                Ok(created)
            }
            Err(err) => {
                // Two first visits can race on the unique external_id index;
                // losing that race means the row exists now.
                match self.store.get_account_by_external_id(external_id).await? {
                    Some(existing) => {
                        debug!(
                            account_id = existing.id,
                            "Create raced with another request, reusing existing account"
                        );
                        Ok(existing)
                    }
                    None => Err(err),
                }
            }
        }
    }
}
