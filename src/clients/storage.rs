use anyhow::Result;
use reqwest::Client;
use std::time::Duration;

use crate::config::StorageConfig;

/// Durable blob storage: pull bytes from a temporary URL, push them under a
/// stable path, get a public URL back.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>>;

    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;
}

/// Blob-storage client for the hosted store: uploads image bytes and hands
/// back durable public URLs.
pub struct StorageClient {
    client: Client,
    base_url: String,
    bucket: String,
    api_key: String,
}

impl StorageClient {
    pub fn new(config: &StorageConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent("AvatarForge/1.0")
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            bucket: config.bucket.clone(),
            api_key,
        })
    }

    #[must_use]
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, path
        )
    }
}

#[async_trait::async_trait]
impl BlobStore for StorageClient {
    /// Pulls the bytes behind a (typically temporary, pre-signed) URL.
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Failed to fetch image: {}",
                response.status()
            ));
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }

    /// Uploads an object (upsert) and returns its public URL.
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Blob upload failed: {} - {}", status, body));
        }

        Ok(self.public_url(path))
    }
}
