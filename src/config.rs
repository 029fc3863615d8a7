use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub platform: PlatformConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub uploads: UploadConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Hosted backend-as-a-service endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformConfig {
    #[serde(default = "default_platform_url")]
    pub url: String,
    #[serde(default)]
    pub anon_key: String,
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// When set, access tokens are verified locally instead of asking the auth service
    #[serde(default)]
    pub jwt_secret: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Platform,
    Local,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataBackend {
    #[default]
    Platform,
    Sqlite,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_local_path")]
    pub local_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetadataConfig {
    #[serde(default)]
    pub backend: MetadataBackend,
    #[serde(default = "default_db_path")]
    pub database_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_cache_control")]
    pub cache_control: String,
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreviewConfig {
    #[serde(default = "default_signed_url_ttl")]
    pub signed_url_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub cookie_secure: bool,
    /// Workspaces unused for this long are dropped
    #[serde(default = "default_workspace_idle")]
    pub workspace_idle_secs: u64,
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_platform_url() -> String {
    "http://localhost:54321".to_string()
}

fn default_bucket() -> String {
    "user-files".to_string()
}

fn default_local_path() -> String {
    "data/objects".to_string()
}

fn default_db_path() -> String {
    "data/filestash.db".to_string()
}

fn default_cache_control() -> String {
    "3600".to_string()
}

fn default_max_bytes() -> usize {
    50 * 1024 * 1024
}

fn default_signed_url_ttl() -> u64 {
    3600
}

fn default_workspace_idle() -> u64 {
    30 * 60
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            url: default_platform_url(),
            anon_key: String::new(),
            bucket: default_bucket(),
            jwt_secret: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            local_path: default_local_path(),
        }
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            backend: MetadataBackend::default(),
            database_path: default_db_path(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            cache_control: default_cache_control(),
            max_bytes: default_max_bytes(),
        }
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            signed_url_ttl_secs: default_signed_url_ttl(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_secure: false,
            workspace_idle_secs: default_workspace_idle(),
        }
    }
}

impl SessionConfig {
    pub fn workspace_idle(&self) -> Duration {
        Duration::from_secs(self.workspace_idle_secs)
    }
}

impl PreviewConfig {
    pub fn signed_url_ttl(&self) -> Duration {
        Duration::from_secs(self.signed_url_ttl_secs)
    }
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_from_file()?;
        config.apply_env_overrides(|key| env::var(key).ok());
        config.ensure_directories()?;
        if config.platform.anon_key.is_empty()
            && (config.storage.backend == StorageBackend::Platform
                || config.metadata.backend == MetadataBackend::Platform)
        {
            tracing::warn!("platform.anon_key is empty; platform requests will be rejected");
        }
        tracing::info!(
            "Platform {} (bucket {}), storage backend {:?}, metadata backend {:?}",
            config.platform.url,
            config.platform.bucket,
            config.storage.backend,
            config.metadata.backend
        );
        Ok(config)
    }

    fn load_from_file() -> anyhow::Result<Self> {
        let config_paths = ["config.toml", "data/config.toml"];

        for path in config_paths {
            if Path::new(path).exists() {
                let content = fs::read_to_string(path)?;
                let config = Self::from_toml(&content)?;
                tracing::info!("Loaded configuration from {}", path);
                return Ok(config);
            }
        }

        tracing::info!("No configuration file found, using defaults");
        Ok(Config::default())
    }

    /// Parse a TOML document; a blank `jwt_secret` counts as unset
    fn from_toml(content: &str) -> anyhow::Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        config.platform.jwt_secret = config
            .platform
            .jwt_secret
            .take()
            .filter(|s| !s.trim().is_empty());
        Ok(config)
    }

    /// Apply environment variable overrides
    /// Format: FS_CONF_<SECTION>_<KEY>
    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Server overrides
        if let Some(val) = var("FS_CONF_SERVER_HOST") {
            self.server.host = val;
        }
        if let Some(port) = var("FS_CONF_SERVER_PORT").and_then(|v| v.parse().ok()) {
            self.server.port = port;
        }

        // Platform overrides
        if let Some(val) = var("FS_CONF_PLATFORM_URL") {
            self.platform.url = val;
        }
        if let Some(val) = var("FS_CONF_PLATFORM_ANON_KEY") {
            self.platform.anon_key = val;
        }
        if let Some(val) = var("FS_CONF_PLATFORM_BUCKET") {
            if !val.trim().is_empty() {
                self.platform.bucket = val;
            }
        }
        if let Some(val) = var("FS_CONF_PLATFORM_JWT_SECRET") {
            self.platform.jwt_secret = Some(val).filter(|s| !s.trim().is_empty());
        }

        // Storage overrides
        match var("FS_CONF_STORAGE_BACKEND").as_deref() {
            Some("local") => self.storage.backend = StorageBackend::Local,
            Some("platform") => self.storage.backend = StorageBackend::Platform,
            Some(other) => tracing::warn!("Ignoring unknown storage backend: {}", other),
            None => {}
        }
        if let Some(val) = var("FS_CONF_STORAGE_LOCAL_PATH") {
            self.storage.local_path = val;
        }

        // Metadata overrides
        match var("FS_CONF_METADATA_BACKEND").as_deref() {
            Some("sqlite") => self.metadata.backend = MetadataBackend::Sqlite,
            Some("platform") => self.metadata.backend = MetadataBackend::Platform,
            Some(other) => tracing::warn!("Ignoring unknown metadata backend: {}", other),
            None => {}
        }
        if let Some(val) = var("FS_CONF_METADATA_DATABASE_PATH") {
            self.metadata.database_path = val;
        }

        // Upload / preview / session overrides
        if let Some(val) = var("FS_CONF_UPLOADS_CACHE_CONTROL") {
            self.uploads.cache_control = val;
        }
        if let Some(max) = var("FS_CONF_UPLOADS_MAX_BYTES").and_then(|v| v.parse().ok()) {
            self.uploads.max_bytes = max;
        }
        if let Some(ttl) = var("FS_CONF_PREVIEW_SIGNED_URL_TTL_SECS").and_then(|v| v.parse().ok()) {
            self.preview.signed_url_ttl_secs = ttl;
        }
        if let Some(secure) = var("FS_CONF_SESSION_COOKIE_SECURE").and_then(|v| v.parse().ok()) {
            self.session.cookie_secure = secure;
        }
        if let Some(secs) = var("FS_CONF_SESSION_WORKSPACE_IDLE_SECS").and_then(|v| v.parse().ok()) {
            self.session.workspace_idle_secs = secs;
        }
    }

    /// Ensure directories for local backends exist
    fn ensure_directories(&self) -> anyhow::Result<()> {
        if self.metadata.backend == MetadataBackend::Sqlite {
            if let Some(parent) = Path::new(&self.metadata.database_path).parent() {
                fs::create_dir_all(parent)?;
            }
        }

        if self.storage.backend == StorageBackend::Local {
            fs::create_dir_all(&self.storage.local_path)?;
        }

        Ok(())
    }
}
