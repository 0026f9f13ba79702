//! Storage configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory of the JSON file repository
    #[serde(default = "default_ddt_dir")]
    pub ddt_dir: PathBuf,
}

fn default_ddt_dir() -> PathBuf {
    PathBuf::from("./ddts")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            ddt_dir: default_ddt_dir(),
        }
    }
}

impl StorageConfig {
    /// Validate storage configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.ddt_dir.as_os_str().is_empty() {
            return Err(ValidationError::EmptyDdtDir);
        }
        Ok(())
    }
}
