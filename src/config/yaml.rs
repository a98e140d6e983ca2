//! YAML configuration loading and parsing

use crate::config::Config;
use crate::error::FetchError;
use anyhow::{Context as _, Result};
use std::fs;
use std::path::Path;

/// Load and parse YAML configuration from file
///
/// # Errors
///
/// Returns an error if the file does not exist, cannot be read, or does not
/// match the settings layout
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.is_file() {
        return Err(FetchError::configuration(format!(
            "Configuration file not found: {}",
            path.display()
        ))
        .into());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

    parse_config(&content).with_context(|| {
        format!(
            "Failed to parse YAML configuration in file: {}\n\
            Please check the syntax and keys of your configuration file",
            path.display()
        )
    })
}

/// Parse settings from YAML text; an empty document yields the defaults
///
/// # Errors
///
/// Returns an error on malformed YAML or unknown keys
pub fn parse_config(content: &str) -> Result<Config> {
    if content.trim().is_empty() {
        return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(content)?)
}
