use anyhow::Result;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::config::GenerationConfig;

#[derive(Debug, Deserialize)]
struct ImageResponse {
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
}

/// Produces one image for a prompt and returns a (temporary) URL to it.
#[async_trait::async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Image-generation client. This is the slowest upstream in the pipeline, so
/// it is the one client with an explicitly generous timeout.
pub struct ImageGenClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    size: String,
    quality: String,
    style: String,
}

impl ImageGenClient {
    pub fn new(config: &GenerationConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.image_timeout_seconds))
            .user_agent("AvatarForge/1.0")
            .build()?;

        Ok(Self {
            client,
            base_url: config.image_base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.image_model.clone(),
            size: config.image_size.clone(),
            quality: config.image_quality.clone(),
            style: config.image_style.clone(),
        })
    }
}

#[async_trait::async_trait]
impl ImageGenerator for ImageGenClient {
    /// Generates one image and returns the provider's temporary URL.
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/v1/images/generations", self.base_url);

        let body = json!({
            "model": self.model,
            "prompt": prompt,
            "n": 1,
            "size": self.size,
            "quality": self.quality,
            "style": self.style,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Image generation API error: {} - {}",
                status,
                body
            ));
        }

        let images: ImageResponse = response.json().await?;

        images
            .data
            .into_iter()
            .next()
            .and_then(|image| image.url)
            .ok_or_else(|| anyhow::anyhow!("Image generation returned no URL"))
    }
}
