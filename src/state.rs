use std::sync::Arc;

use crate::clients::identity::{IdentityClient, IdentityProvider};
use crate::clients::imagegen::{ImageGenClient, ImageGenerator};
use crate::clients::storage::{BlobStore, StorageClient};
use crate::clients::textgen::{TextGenClient, TextGenerator};
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AdminService, AvatarService, CreditService, GenerationService, ProvisioningService,
};

/// Reads a provider secret from the environment. Missing keys resolve to an
/// empty string so the server can boot without every upstream configured;
/// calls against that upstream will fail with its own auth error.
fn secret(name: &str) -> String {
    std::env::var(name).unwrap_or_default()
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Config,

    pub store: Store,

    pub identity: Arc<dyn IdentityProvider>,

    pub provisioning: ProvisioningService,

    pub credits: CreditService,

    pub generation: GenerationService,

    pub avatars: AvatarService,

    pub admin: AdminService,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let identity: Arc<dyn IdentityProvider> = Arc::new(IdentityClient::new(
            &config.identity,
            secret("IDENTITY_API_KEY"),
        )?);
        Self::with_identity(config, identity).await
    }

    /// Builds the state with an injected identity provider. Production uses
    /// the HTTP client; tests substitute their own implementation.
    pub async fn with_identity(
        config: Config,
        identity: Arc<dyn IdentityProvider>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let textgen: Arc<dyn TextGenerator> = Arc::new(TextGenClient::new(
            &config.generation,
            secret("TEXTGEN_API_KEY"),
        )?);
        let imagegen: Arc<dyn ImageGenerator> = Arc::new(ImageGenClient::new(
            &config.generation,
            secret("IMAGEGEN_API_KEY"),
        )?);
        let storage: Arc<dyn BlobStore> = Arc::new(StorageClient::new(
            &config.storage,
            secret("STORAGE_API_KEY"),
        )?);

        let provisioning = ProvisioningService::new(store.clone(), config.access.clone());
        let credits = CreditService::new(store.clone());

        let generation = GenerationService::new(
            store.clone(),
            textgen,
            imagegen,
            storage,
            credits.clone(),
            config.access.generation_cost,
        );

        let avatars = AvatarService::new(store.clone());
        let admin = AdminService::new(store.clone(), credits.clone(), config.access.clone());

        Ok(Self {
            config,
            store,
            identity,
            provisioning,
            credits,
            generation,
            avatars,
            admin,
        })
    }
}
