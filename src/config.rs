use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub access: AccessConfig,

    pub identity: IdentityConfig,

    pub generation: GenerationConfig,

    pub storage: StorageConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/avatarforge.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 6710,
            cors_allowed_origins: vec![
                "http://localhost:6710".to_string(),
                "http://127.0.0.1:6710".to_string(),
            ],
        }
    }
}

/// Access policy: who gets admin rights at provisioning time and what the
/// credit economy charges.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Emails granted admin rights (activated + authenticated) on first visit.
    pub admin_emails: Vec<String>,

    /// The only email allowed to grant or revoke admin rights.
    pub super_admin_email: String,

    /// Credits a freshly provisioned account starts with (default: 5)
    pub starting_credits: i64,

    /// Credits one avatar generation costs (default: 1)
    pub generation_cost: i64,

    /// Credits a bulk-imported account starts with (default: 5)
    pub bulk_default_credits: i64,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            admin_emails: Vec::new(),
            super_admin_email: String::new(),
            starting_credits: 5,
            generation_cost: 1,
            bulk_default_credits: 5,
        }
    }
}

impl AccessConfig {
    #[must_use]
    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_emails.iter().any(|e| e.eq_ignore_ascii_case(email))
            || self.is_super_admin_email(email)
    }

    #[must_use]
    pub fn is_super_admin_email(&self, email: &str) -> bool {
        !self.super_admin_email.is_empty() && self.super_admin_email.eq_ignore_ascii_case(email)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Base URL of the identity provider's backend API.
    /// Secret key comes from the IDENTITY_API_KEY environment variable.
    pub base_url: String,

    /// Request timeout in seconds (default: 10)
    pub request_timeout_seconds: u64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.identity.example.com".to_string(),
            request_timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Text-generation API. Secret key: TEXTGEN_API_KEY.
    pub text_base_url: String,

    pub text_model: String,

    pub text_max_tokens: u32,

    pub text_temperature: f32,

    /// Image-generation API. Secret key: IMAGEGEN_API_KEY.
    pub image_base_url: String,

    pub image_model: String,

    pub image_size: String,

    pub image_quality: String,

    pub image_style: String,

    /// Image generation is the slowest upstream call and gets its own
    /// generous timeout (default: 120)
    pub image_timeout_seconds: u64,

    /// Request timeout for text generation in seconds (default: 60)
    pub text_timeout_seconds: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            text_base_url: "https://api.openai.com".to_string(),
            text_model: "gpt-4".to_string(),
            text_max_tokens: 3000,
            text_temperature: 0.7,
            image_base_url: "https://api.openai.com".to_string(),
            image_model: "dall-e-3".to_string(),
            image_size: "1024x1024".to_string(),
            image_quality: "standard".to_string(),
            image_style: "natural".to_string(),
            image_timeout_seconds: 120,
            text_timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Base URL of the hosted blob store. Secret key: STORAGE_API_KEY.
    pub base_url: String,

    /// Bucket that receives avatar images.
    pub bucket: String,

    /// Request timeout in seconds (default: 30)
    pub request_timeout_seconds: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_url: "https://storage.example.com".to_string(),
            bucket: "avatars".to_string(),
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            access: AccessConfig::default(),
            identity: IdentityConfig::default(),
            generation: GenerationConfig::default(),
            storage: StorageConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("avatarforge").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".avatarforge").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.access.starting_credits < 0 {
            anyhow::bail!("starting_credits cannot be negative");
        }

        if self.access.generation_cost < 1 {
            anyhow::bail!("generation_cost must be at least 1");
        }

        if self.server.enabled && self.server.port == 0 {
            anyhow::bail!("Server port cannot be 0 when the server is enabled");
        }

        Ok(())
    }
}
