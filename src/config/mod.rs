//! Application configuration module
//!
//! This module provides type-safe configuration loading using the `config`
//! and `dotenvy` crates. Sources, later ones winning:
//!
//! 1. `.env` file (development)
//! 2. optional `ddt-engine.{toml,yaml,json}` file
//! 3. `DDT_ENGINE__*` environment variables, `__` separating nested values
//!
//! # Example
//!
//! ```no_run
//! use ddt_engine::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("DDTs stored in {}", config.storage.ddt_dir.display());
//! ```

mod assembler;
mod error;
mod logging;
mod runtime;
mod storage;

pub use assembler::AssemblerConfig;
pub use error::{ConfigError, ValidationError};
pub use logging::LoggingConfig;
pub use runtime::RuntimeConfig;
pub use storage::StorageConfig;

use serde::Deserialize;

/// Default configuration file name, without extension.
pub const CONFIG_FILE: &str = "ddt-engine";

/// Root application configuration
///
/// Every section has defaults, so an empty environment is a valid setup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Dialogue runtime (parser timeout, terminal nodes, attempt limit)
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Assembly policy overrides
    #[serde(default)]
    pub assembler: AssemblerConfig,

    /// DDT persistence
    #[serde(default)]
    pub storage: StorageConfig,

    /// Log filter and format
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from `.env`, `ddt-engine.*` and the environment
    ///
    /// # Environment Variable Format
    ///
    /// - `DDT_ENGINE__RUNTIME__PARSER_TIMEOUT_MS=2000` -> `runtime.parser_timeout_ms = 2000`
    /// - `DDT_ENGINE__STORAGE__DDT_DIR=/var/ddts` -> `storage.ddt_dir = /var/ddts`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();
        Self::load_from(CONFIG_FILE)
    }

    /// Same as [`load`](Self::load) with an explicit configuration file.
    ///
    /// The file is optional; its format follows the extension, and a bare
    /// name is tried with every supported extension.
    pub fn load_from(file: &str) -> Result<Self, ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(file).required(false))
            .add_source(
                config::Environment::default()
                    .prefix("DDT_ENGINE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a zero timeout, `max_attempts == 0`,
    /// unknown step names or action kinds, empty terminal ids, an empty DDT
    /// directory or an unparsable log filter.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.runtime.validate()?;
        self.assembler.validate()?;
        self.storage.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
