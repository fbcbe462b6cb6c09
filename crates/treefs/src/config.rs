//! Backend configuration.
//!
//! Loaded from TOML:
//!
//! ```toml
//! max_symlink_hops = 40
//! temporary_prefix = "scratch-"
//! temporary_parent = "/tmp"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use treefs_path::{FsPath, PathError};

/// Linux `MAXSYMLINKS`.
pub const DEFAULT_MAX_SYMLINK_HOPS: usize = 40;

/// Errors from loading a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid temporary_prefix {prefix:?}: {source}")]
    InvalidPrefix {
        prefix: String,
        #[source]
        source: PathError,
    },
}

/// Settings shared by the memory and native backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FsConfig {
    /// Link hops allowed while resolving one path.
    pub max_symlink_hops: usize,

    /// Prepended to the random name of each temporary directory.
    pub temporary_prefix: String,

    /// Directory that temporary directories are created in. Must exist.
    pub temporary_parent: FsPath,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            max_symlink_hops: DEFAULT_MAX_SYMLINK_HOPS,
            temporary_prefix: String::new(),
            temporary_parent: FsPath::root(),
        }
    }
}

impl FsConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that deserialize fine but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.temporary_prefix.is_empty() {
            return Ok(());
        }
        FsPath::relative([self.temporary_prefix.as_str()])
            .map(drop)
            .map_err(|source| ConfigError::InvalidPrefix {
                prefix: self.temporary_prefix.clone(),
                source,
            })
    }

    /// Read and parse a TOML file from the host filesystem.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Set the symlink hop bound.
    pub fn with_max_symlink_hops(mut self, hops: usize) -> Self {
        self.max_symlink_hops = hops;
        self
    }

    /// Set the temporary directory name prefix.
    pub fn with_temporary_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.temporary_prefix = prefix.into();
        self
    }

    /// Set where temporary directories are created.
    pub fn with_temporary_parent(mut self, parent: FsPath) -> Self {
        self.temporary_parent = parent;
        self
    }

    /// Path for a fresh temporary directory: `parent/prefix<uuid hex>`.
    pub(crate) fn temporary_path(&self) -> Result<FsPath, PathError> {
        let name = format!(
            "{}{}",
            self.temporary_prefix,
            uuid::Uuid::new_v4().as_simple()
        );
        Ok(self.temporary_parent.join(&FsPath::relative([name])?))
    }
}
