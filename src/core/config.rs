//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::core::errors::{Result, SlugError};

/// Environment variable prefix, e.g. `SLUG_TRANSLATOR_PORT`
pub const ENV_PREFIX: &str = "SLUG_TRANSLATOR";

/// Optional config file basename, any format the `config` crate knows
pub const CONFIG_FILE: &str = "slug-translator";

/// Process configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// JSON file backing the settings store
    pub store_path: PathBuf,
    /// Upper bound for one provider attempt
    pub attempt_timeout_ms: u64,
    /// Existing slugs used by the uniqueness checker
    #[serde(default)]
    pub slug_index_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            store_path: PathBuf::from("slug-settings.json"),
            attempt_timeout_ms: 10_000,
            slug_index_path: None,
        }
    }
}

impl AppConfig {
    /// Load defaults, then the optional config file, then environment variables
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Same as [`AppConfig::load`] with an explicit config file basename
    pub fn load_from(file: &Path) -> Result<Self> {
        let defaults = Self::default();
        let settings = ::config::Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", defaults.port as i64)?
            .set_default("store_path", defaults.store_path.display().to_string())?
            .set_default("attempt_timeout_ms", defaults.attempt_timeout_ms as i64)?
            .add_source(::config::File::with_name(&file.display().to_string()).required(false))
            .add_source(::config::Environment::with_prefix(ENV_PREFIX))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;

        info!(
            "Loaded configuration: store={}, attempt timeout={}ms",
            config.store_path.display(),
            config.attempt_timeout_ms
        );

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.attempt_timeout_ms == 0 {
            return Err(SlugError::ConfigError {
                message: "attempt_timeout_ms must be greater than 0".to_string(),
            });
        }

        if self.store_path.as_os_str().is_empty() {
            return Err(SlugError::ConfigError {
                message: "store_path is required".to_string(),
            });
        }

        Ok(())
    }

    /// Per-attempt timeout as a [`Duration`]
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }
}
