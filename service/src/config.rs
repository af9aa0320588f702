use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Application configuration loaded from multiple sources.
///
/// Configuration is loaded in priority order (lowest to highest):
/// 1. Struct defaults
/// 2. config.yaml file (if exists)
/// 3. Environment variables with LS_ prefix (always wins)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourcesConfig {
    /// Base URL of the biographical directory's per-member JSON endpoint.
    #[serde(default = "default_bioguide_base_url")]
    pub bioguide_base_url: String,

    /// Base URL of the GovTrack API.
    #[serde(default = "default_govtrack_base_url")]
    pub govtrack_base_url: String,

    /// URL of the bulk legislators dataset (fetched whole, cached).
    #[serde(default = "default_legislators_dataset_url")]
    pub legislators_dataset_url: String,

    /// Base URL for member portrait images.
    #[serde(default = "default_member_photo_base_url")]
    pub member_photo_base_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    /// How long a fetched copy of the bulk dataset stays valid.
    #[serde(default = "default_dataset_cache_ttl_hours")]
    pub dataset_cache_ttl_hours: u64,

    /// Consecutive failures after which a never-successful source is skipped.
    #[serde(default = "default_max_fail_count")]
    pub max_fail_count: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level filter (debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_bioguide_base_url() -> String {
    "https://bioguide.congress.gov/search/bio".to_string()
}

fn default_govtrack_base_url() -> String {
    "https://www.govtrack.us/api/v2".to_string()
}

fn default_legislators_dataset_url() -> String {
    "https://unitedstates.github.io/congress-legislators/legislators-current.json".to_string()
}

fn default_member_photo_base_url() -> String {
    "https://unitedstates.github.io/images/congress/450x550".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_dataset_cache_ttl_hours() -> u64 {
    24
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_fail_count() -> u32 {
    3
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            bioguide_base_url: default_bioguide_base_url(),
            govtrack_base_url: default_govtrack_base_url(),
            legislators_dataset_url: default_legislators_dataset_url(),
            member_photo_base_url: default_member_photo_base_url(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            dataset_cache_ttl_hours: default_dataset_cache_ttl_hours(),
            max_fail_count: default_max_fail_count(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: SourcesConfig::default(),
            sync: SyncConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    /// Returns an error if configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config.yaml")
    }

    /// Load configuration with a custom YAML file path.
    ///
    /// # Errors
    /// Returns an error if configuration cannot be loaded or is invalid.
    pub fn load_from(yaml_path: &str) -> Result<Self, ConfigError> {
        let config: Self = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Yaml::file(yaml_path))
            .merge(Env::prefixed("LS_").split("__"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let urls = [
            ("sources.bioguide_base_url", &self.sources.bioguide_base_url),
            ("sources.govtrack_base_url", &self.sources.govtrack_base_url),
            (
                "sources.legislators_dataset_url",
                &self.sources.legislators_dataset_url,
            ),
            (
                "sources.member_photo_base_url",
                &self.sources.member_photo_base_url,
            ),
        ];
        for (key, url) in urls {
            if url.is_empty() {
                return Err(ConfigError::Validation(format!("{key} is required")));
            }
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::Validation(format!(
                    "{key} must start with http:// or https://, got: '{url}'"
                )));
            }
        }

        if self.sync.dataset_cache_ttl_hours == 0 {
            return Err(ConfigError::Validation(
                "sync.dataset_cache_ttl_hours cannot be 0".into(),
            ));
        }

        if self.sync.max_fail_count == 0 {
            return Err(ConfigError::Validation(
                "sync.max_fail_count cannot be 0".into(),
            ));
        }

        Ok(())
    }
}
