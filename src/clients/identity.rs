use anyhow::Result;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::config::IdentityConfig;

/// Who the caller is, as vouched for by the identity provider.
#[derive(Debug, Clone)]
pub struct Identity {
    pub external_id: String,
    pub email: String,
}

/// Resolves a bearer token to an identity. The HTTP implementation talks to
/// the hosted provider; tests inject their own implementation.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `Ok(None)` means the token is unknown or expired; errors are reserved
    /// for the provider being unreachable or misbehaving.
    async fn verify_token(&self, token: &str) -> Result<Option<Identity>>;
}

#[derive(Debug, Deserialize)]
struct VerifySessionResponse {
    user_id: String,
    email: String,
}

pub struct IdentityClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl IdentityClient {
    pub fn new(config: &IdentityConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent("AvatarForge/1.0")
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait::async_trait]
impl IdentityProvider for IdentityClient {
    async fn verify_token(&self, token: &str) -> Result<Option<Identity>> {
        let url = format!("{}/v1/sessions/verify", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "token": token }))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Identity provider error: {} - {}",
                status,
                body
            ));
        }

        let session: VerifySessionResponse = response.json().await?;

        Ok(Some(Identity {
            external_id: session.user_id,
            email: session.email,
        }))
    }
}
