use anyhow::Result;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

pub mod defaults;
pub mod duration_serde;

use crate::errors::AppError;
use defaults::*;
use duration_serde::{duration, parse_default};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub images: ImageConfig,
    #[serde(default)]
    pub compression: CompressionConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub notification: NotificationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Prefix prepended to relative image paths (the deployment base path)
    #[serde(default = "default_asset_base_path")]
    pub base_path: String,
    /// Origin that relative image URLs are fetched from when preloading;
    /// unset means only absolute URLs can be preloaded
    pub origin: Option<String>,
}

/// Hosted backend connection. Leaving `url` or `anon_key` unset is a valid
/// state: every remote operation then falls back to local behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub url: Option<String>,
    pub anon_key: Option<String>,
    #[serde(default = "default_storage_bucket")]
    pub bucket: String,
    #[serde(default = "default_storage_path_prefix")]
    pub path_prefix: String,
    #[serde(default = "default_storage_cache_control")]
    pub cache_control: String,
    #[serde(default = "default_connect_timeout", with = "duration")]
    pub connect_timeout: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Number of images loaded concurrently per preload batch
    #[serde(default = "default_preload_batch_size")]
    pub preload_batch_size: usize,
    /// Pause between background preload batches
    #[serde(default = "default_preload_batch_delay", with = "duration")]
    pub preload_batch_delay: Duration,
    /// Viewport expansion used by the lazy loader visibility gate
    #[serde(default = "default_root_margin_px")]
    pub root_margin_px: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    #[serde(default = "default_max_width")]
    pub max_width: u32,
    #[serde(default = "default_max_height")]
    pub max_height: u32,
    #[serde(default = "default_quality")]
    pub quality: f32,
    #[serde(default = "default_max_size_kb")]
    pub max_size_kb: u64,
    /// Uploads above this size are rejected before compression
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Webhook endpoint receiving order summaries; unset skips notifications
    pub webhook_url: Option<String>,
    #[serde(default = "default_notification_title")]
    pub title: String,
}

// Web defaults
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_asset_base_path() -> String {
    DEFAULT_ASSET_BASE_PATH.to_string()
}

// Remote defaults
fn default_storage_bucket() -> String {
    DEFAULT_STORAGE_BUCKET.to_string()
}

fn default_storage_path_prefix() -> String {
    DEFAULT_STORAGE_PATH_PREFIX.to_string()
}

fn default_storage_cache_control() -> String {
    DEFAULT_STORAGE_CACHE_CONTROL.to_string()
}

fn default_connect_timeout() -> Duration {
    parse_default(DEFAULT_CONNECT_TIMEOUT)
}

// Image defaults
fn default_preload_batch_size() -> usize {
    DEFAULT_PRELOAD_BATCH_SIZE
}

fn default_preload_batch_delay() -> Duration {
    parse_default(DEFAULT_PRELOAD_BATCH_DELAY)
}

fn default_root_margin_px() -> f64 {
    DEFAULT_ROOT_MARGIN_PX
}

// Compression defaults
fn default_max_width() -> u32 {
    DEFAULT_MAX_WIDTH
}

fn default_max_height() -> u32 {
    DEFAULT_MAX_HEIGHT
}

fn default_quality() -> f32 {
    DEFAULT_QUALITY
}

fn default_max_size_kb() -> u64 {
    DEFAULT_MAX_SIZE_KB
}

fn default_max_upload_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}

// Storage defaults
fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

fn default_notification_title() -> String {
    DEFAULT_NOTIFICATION_TITLE.to_string()
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            base_path: default_asset_base_path(),
            origin: None,
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            bucket: default_storage_bucket(),
            path_prefix: default_storage_path_prefix(),
            cache_control: default_storage_cache_control(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            preload_batch_size: default_preload_batch_size(),
            preload_batch_delay: default_preload_batch_delay(),
            root_margin_px: default_root_margin_px(),
        }
    }
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            max_width: default_max_width(),
            max_height: default_max_height(),
            quality: default_quality(),
            max_size_kb: default_max_size_kb(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            title: default_notification_title(),
        }
    }
}

impl RemoteConfig {
    /// Both endpoint and key must be present and non-blank
    pub fn is_configured(&self) -> bool {
        let present = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());
        present(&self.url) && present(&self.anon_key)
    }

    /// Overlay the endpoint/key pair from environment-style variables.
    /// Values that are absent leave the file configuration untouched.
    pub fn apply_env(&mut self, url: Option<String>, anon_key: Option<String>) {
        if let Some(url) = url.filter(|v| !v.trim().is_empty()) {
            self.url = Some(url);
        }
        if let Some(key) = anon_key.filter(|v| !v.trim().is_empty()) {
            self.anon_key = Some(key);
        }
    }
}

impl CompressionConfig {
    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_kb * 1024
    }

    /// Quality is a fraction in `(0, 1]`
    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.quality > 0.0 && self.quality <= 1.0) {
            return Err(AppError::configuration(format!(
                "compression.quality must be in (0, 1], got {}",
                self.quality
            )));
        }
        Ok(())
    }
}

impl Config {
    /// Layer defaults, the TOML file (if present), `ORDER_MENU_*` variables
    /// and finally the remote store variables.
    pub fn load_from_file(config_file: &str) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if Path::new(config_file).exists() {
            figment = figment.merge(Toml::file(config_file));
            info!("Configuration loaded from: {}", config_file);
        } else {
            warn!("Config file {} not found, using defaults", config_file);
        }
        let mut config: Config = figment
            .merge(Env::prefixed("ORDER_MENU_").split("__"))
            .extract()?;

        config.remote.apply_env(
            std::env::var(ENV_REMOTE_URL).ok(),
            std::env::var(ENV_REMOTE_KEY).ok(),
        );

        config.validate()?;

        if !config.remote.is_configured() {
            warn!(
                "Remote store not configured ({} / {} unset), running with local data only",
                ENV_REMOTE_URL, ENV_REMOTE_KEY
            );
        }

        Ok(config)
    }

    /// Parse a configuration document on top of the defaults
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::string(contents))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would otherwise be silently clamped
    pub fn validate(&self) -> Result<(), AppError> {
        self.compression.validate()
    }
}
