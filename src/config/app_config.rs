use std::time::Duration;

use serde::Deserialize;

use crate::infrastructure::cache::CacheType;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub cache: CacheSettings,
    pub repository: RepositorySettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

/// Result caching settings shared by every repository
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// When false every read goes straight to the executor
    pub enabled: bool,
    pub store: CacheType,
    pub cache_minutes: u64,
    pub use_sliding_expiration: bool,
    pub skip_if_empty: bool,
    pub max_capacity: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            store: CacheType::default(),
            cache_minutes: 10,
            use_sliding_expiration: false,
            skip_if_empty: true,
            max_capacity: 10_000,
        }
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.cache_minutes * 60)
    }

    /// Whether results are cached at all
    pub fn is_active(&self) -> bool {
        self.enabled && self.cache_minutes > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RepositorySettings {
    pub default_linked_items_depth: u32,
    /// Website channel used when the scope does not name one
    pub default_channel: Option<String>,
    pub default_language: Option<String>,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            default_linked_items_depth: 0,
            default_channel: None,
            default_language: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
