// ABOUTME: Storage configuration for the letterbox user store.
// ABOUTME: Names the user directory and file extension, loadable from environment variables.

use std::path::{Path, PathBuf};

use thiserror::Error;

pub const DEFAULT_USER_DIR: &str = "../../data/users";
pub const DEFAULT_USER_EXT: &str = ".ur";

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("LETTERBOX_USER_EXT must not be empty")]
    EmptyExtension,
}

/// Where user files live and what they are called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub dir: PathBuf,
    /// File extension including the leading dot, e.g. `.ur`.
    pub extension: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_USER_DIR),
            extension: DEFAULT_USER_EXT.to_string(),
        }
    }
}

impl StoreConfig {
    /// Build a config from an explicit directory and extension. A missing
    /// leading dot on the extension is added.
    pub fn new(dir: impl Into<PathBuf>, extension: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            dir: dir.into(),
            extension: normalize_extension(extension)?,
        })
    }

    /// Load configuration from environment variables with sensible defaults.
    ///
    /// Environment variables:
    /// - LETTERBOX_USER_DIR: directory holding user files (default: ../../data/users)
    /// - LETTERBOX_USER_EXT: user file extension (default: .ur)
    pub fn from_env() -> Result<Self, ConfigError> {
        let dir = std::env::var("LETTERBOX_USER_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_USER_DIR));

        let extension = std::env::var("LETTERBOX_USER_EXT")
            .unwrap_or_else(|_| DEFAULT_USER_EXT.to_string());

        Self::new(dir, &extension)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn normalize_extension(extension: &str) -> Result<String, ConfigError> {
    let bare = extension.trim().trim_start_matches('.');
    if bare.is_empty() {
        return Err(ConfigError::EmptyExtension);
    }
    Ok(format!(".{}", bare))
}
