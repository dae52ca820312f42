use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;

#[derive(Clone, Debug, PartialEq)]
pub struct CartConfig {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub cart: CartServiceConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StorageConfig {
    /// JSON document holding the local key/value slots.
    pub path: PathBuf,
    pub key: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CartServiceConfig {
    pub buffer_size: usize,
    /// Zero disables the stock cache.
    pub stock_cache_ttl_ms: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://localhost:3333".to_string(),
                timeout_secs: 10,
            },
            storage: StorageConfig {
                path: PathBuf::from("storefront-storage.json"),
                key: "@RocketShoes:cart".to_string(),
            },
            cart: CartServiceConfig {
                buffer_size: 32,
                stock_cache_ttl_ms: 0,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Compact,
            },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl CartServiceConfig {
    pub fn stock_cache_ttl(&self) -> Duration {
        Duration::from_millis(self.stock_cache_ttl_ms)
    }
}

impl CartConfig {
    /// Defaults, then the TOML file (if any), then `STOREFRONT_*` environment
    /// variables, then validation.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = resolve_config_path(options.config_path.as_deref()) {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("storefront.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides(read_env)?;
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(api) = patch.api {
            if let Some(base_url) = api.base_url {
                self.api.base_url = base_url;
            }
            if let Some(timeout_secs) = api.timeout_secs {
                self.api.timeout_secs = timeout_secs;
            }
        }

        if let Some(storage) = patch.storage {
            if let Some(path) = storage.path {
                self.storage.path = path;
            }
            if let Some(key) = storage.key {
                self.storage.key = key;
            }
        }

        if let Some(cart) = patch.cart {
            if let Some(buffer_size) = cart.buffer_size {
                self.cart.buffer_size = buffer_size;
            }
            if let Some(ttl) = cart.stock_cache_ttl_ms {
                self.cart.stock_cache_ttl_ms = ttl;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup("STOREFRONT_API_BASE_URL") {
            self.api.base_url = value;
        }
        if let Some(value) = lookup("STOREFRONT_API_TIMEOUT_SECS") {
            self.api.timeout_secs = parse_number("STOREFRONT_API_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = lookup("STOREFRONT_STORAGE_PATH") {
            self.storage.path = PathBuf::from(value);
        }
        if let Some(value) = lookup("STOREFRONT_STORAGE_KEY") {
            self.storage.key = value;
        }

        if let Some(value) = lookup("STOREFRONT_CART_BUFFER_SIZE") {
            self.cart.buffer_size = parse_number("STOREFRONT_CART_BUFFER_SIZE", &value)?;
        }
        if let Some(value) = lookup("STOREFRONT_STOCK_CACHE_TTL_MS") {
            self.cart.stock_cache_ttl_ms = parse_number("STOREFRONT_STOCK_CACHE_TTL_MS", &value)?;
        }

        if let Some(value) = lookup("STOREFRONT_LOG_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = lookup("STOREFRONT_LOG_FORMAT") {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self.api.base_url.trim();
        if base_url.is_empty() {
            return Err(ConfigError::Validation("api.base_url must not be empty".to_string()));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Validation(format!(
                "api.base_url must start with http:// or https:// (got `{base_url}`)"
            )));
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Validation("api.timeout_secs must be > 0".to_string()));
        }
        if self.storage.key.trim().is_empty() {
            return Err(ConfigError::Validation("storage.key must not be empty".to_string()));
        }
        if self.cart.buffer_size == 0 {
            return Err(ConfigError::Validation("cart.buffer_size must be > 0".to_string()));
        }
        if let Some(directive) = unknown_level_directive(&self.logging.level) {
            return Err(ConfigError::Validation(format!(
                "logging.level has no recognised level in `{directive}` \
                 (expected off|error|warn|info|debug|trace, optionally as target=level)"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    api: Option<ApiPatch>,
    storage: Option<StoragePatch>,
    cart: Option<CartPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiPatch {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct StoragePatch {
    path: Option<PathBuf>,
    key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CartPatch {
    buffer_size: Option<usize>,
    stock_cache_ttl_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("storefront.toml"), PathBuf::from("config/storefront.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str::<ConfigPatch>(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

/// First comma-separated directive of `filter` whose level does not parse.
/// Directives are either a bare level or `target=level`.
fn unknown_level_directive(filter: &str) -> Option<&str> {
    filter.split(',').map(str::trim).find(|directive| {
        let level = directive.rsplit('=').next().unwrap_or("").trim();
        level.is_empty() || level.parse::<LevelFilter>().is_err()
    })
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}
