//! Configuration management module
//!
//! Loads the optional YAML settings file and layers it under the CLI
//! arguments to produce the settings of one run

pub mod yaml;

use crate::cli::Args;
use crate::error::FetchError;
use crate::operations::{CacheMode, FetchRequest};
use core::time::Duration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings file structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Root of the persistent clone cache
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Always clone into a fresh temporary directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ephemeral: Option<bool>,

    /// Limit for a single git invocation, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Verbose logging and git diagnostics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable or malformed
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        yaml::load_config(path)
    }

    /// Load the explicit settings file, or the default one when present
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An explicit path does not exist
    /// - The chosen file cannot be read or parsed
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }
        match default_config_path() {
            Some(path) if path.is_file() => Self::load_from_file(&path),
            _ => Ok(Self::default()),
        }
    }
}

/// `<config dir>/gitrip/config.yaml`
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("gitrip").join("config.yaml"))
}

/// `<cache dir>/gitrip`
#[must_use]
pub fn default_cache_root() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("gitrip"))
}

/// Everything one run needs, after layering CLI over file over defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub request: FetchRequest,
    pub verbose: bool,
    pub timeout: Option<Duration>,
}

impl Settings {
    /// Resolve the settings for `args`, reading the settings file
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file cannot be loaded or no cache
    /// root can be determined in persistent mode
    pub fn resolve(args: &Args) -> anyhow::Result<Self> {
        let config = Config::load(args.config.as_deref())?;
        Ok(Self::merge(args, &config, default_cache_root())?)
    }

    /// Layer `args` over `config`, falling back to `default_cache`
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error when persistent mode is selected and
    /// no cache root is known
    pub fn merge(
        args: &Args,
        config: &Config,
        default_cache: Option<PathBuf>,
    ) -> Result<Self, FetchError> {
        let ephemeral = args.ephemeral || config.ephemeral.unwrap_or(false);
        let mode = if ephemeral {
            CacheMode::Ephemeral
        } else {
            let cache_root = args
                .cache_dir
                .clone()
                .or_else(|| config.cache_dir.clone())
                .or(default_cache)
                .ok_or_else(|| {
                    FetchError::configuration(
                        "Cannot determine a cache directory; pass --cache-dir or --ephemeral",
                    )
                })?;
            CacheMode::Persistent { cache_root }
        };

        Ok(Self {
            request: FetchRequest {
                remote: args.remote.clone(),
                paths: args.paths.clone(),
                revision: args.tree.clone(),
                destination: args.dest.clone(),
                mode,
            },
            verbose: args.verbose || config.verbose.unwrap_or(false),
            timeout: args
                .timeout
                .or(config.timeout_secs)
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        })
    }
}
