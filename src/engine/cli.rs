//! Updater CLI Module
//! Command-line interface for checking, staging and applying updates

pub mod formatter;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::engine::config::{ConfigError, UpdaterConfig};
use crate::engine::platform::VariantKind;

#[derive(Parser, Debug)]
#[command(name = "feed-updater")]
#[command(version)]
#[command(about = "Check a feed, download and stage update packages", long_about = None)]
pub struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Feed URL, overrides the config file
    #[arg(long, global = true)]
    pub feed: Option<String>,

    /// Updater name (cache directory), overrides the config file
    #[arg(short, long, global = true)]
    pub name: Option<String>,

    /// Cache root, overrides the config file
    #[arg(long, global = true)]
    pub cache_root: Option<PathBuf>,

    /// Package variant, overrides the config file
    #[arg(long, global = true)]
    pub variant: Option<CliVariant>,

    /// Output format (json for scripting)
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliVariant {
    Archive,
    Installer,
}

impl From<CliVariant> for VariantKind {
    fn from(v: CliVariant) -> Self {
        match v {
            CliVariant::Archive => VariantKind::Archive,
            CliVariant::Installer => VariantKind::Installer,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check the feed and stage the latest package
    Check,

    /// Cache management
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Check, then launch the staged package
    Apply,
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List cached packages
    List,

    /// Remove cached packages
    Clean {
        /// Keep packages matching this version
        #[arg(short, long)]
        keep: Option<String>,
    },
}

impl Cli {
    /// Config file merged with command-line overrides
    pub fn resolve_config(&self) -> Result<UpdaterConfig, ConfigError> {
        let mut config = match self.config.as_ref() {
            Some(path) => UpdaterConfig::load(path)?,
            None => match UpdaterConfig::default_path() {
                Some(path) => UpdaterConfig::load_or_default(&path)?,
                None => UpdaterConfig::default(),
            },
        };

        if let Some(feed) = &self.feed {
            config.feed_url = Some(feed.clone());
        }
        if let Some(name) = &self.name {
            config.name = name.clone();
        }
        if let Some(root) = &self.cache_root {
            config.cache_root = Some(root.clone());
        }
        if let Some(variant) = self.variant {
            config.variant = variant.into();
        }
        config.validate()?;
        Ok(config)
    }
}
