//! Updater Configuration Module
//! Handles loading and validating updater.config.json

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::engine::platform::{ArchiveVariant, InstallerVariant, Platform, PlatformVariant, VariantKind};
use crate::engine::updater::transport::{HttpTransport, DEFAULT_USER_AGENT};
use crate::engine::updater::Updater;

pub const CONFIG_FILE_NAME: &str = "updater.config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Invalid config format: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Invalid updater name: {0:?}")]
    InvalidName(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// Cache directory name under `cache_root`
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub feed_url: Option<String>,
    /// Parent of the cache directory; the platform temp dir when unset
    #[serde(default)]
    pub cache_root: Option<PathBuf>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_variant")]
    pub variant: VariantKind,
    #[serde(default = "default_installer_prefix")]
    pub installer_prefix: String,
    #[serde(default = "default_silent_flag")]
    pub silent_flag: String,
}

fn default_name() -> String {
    "updater".to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_variant() -> VariantKind {
    Platform::current().default_variant()
}

fn default_installer_prefix() -> String {
    InstallerVariant::DEFAULT_PREFIX.to_string()
}

fn default_silent_flag() -> String {
    InstallerVariant::DEFAULT_SILENT_FLAG.to_string()
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            feed_url: None,
            cache_root: None,
            user_agent: default_user_agent(),
            variant: default_variant(),
            installer_prefix: default_installer_prefix(),
            silent_flag: default_silent_flag(),
        }
    }
}

impl UpdaterConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let config: UpdaterConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Default config location: `<config dir>/feed-updater/updater.config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("feed-updater").join(CONFIG_FILE_NAME))
    }

    /// The name becomes a directory under the temp root and must stay a
    /// single path component.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let name = self.name.as_str();
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(ConfigError::InvalidName(self.name.clone()));
        }
        Ok(())
    }

    pub fn platform_variant(&self) -> Arc<dyn PlatformVariant> {
        match self.variant {
            VariantKind::Archive => Arc::new(ArchiveVariant::new(self.name.clone())),
            VariantKind::Installer => Arc::new(
                InstallerVariant::new(self.name.clone(), self.installer_prefix.clone())
                    .with_silent_flag(self.silent_flag.clone()),
            ),
        }
    }

    /// Build an updater wired from this configuration
    pub fn build_updater(&self) -> Result<Updater, ConfigError> {
        self.validate()?;
        let mut builder = Updater::builder(self.platform_variant())
            .transport(Arc::new(HttpTransport::with_user_agent(&self.user_agent)));
        if let Some(root) = &self.cache_root {
            builder = builder.cache_root(root.clone());
        }
        if let Some(url) = &self.feed_url {
            builder = builder.feed_url(url.clone());
        }
        Ok(builder.build())
    }
}
