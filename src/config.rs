//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which holds the currencyapi.com API key and an optional endpoint
//! override.
//!
//! Configuration is stored at `~/.config/ratecache/config.json`; the
//! `CURRENCY_API_KEY` environment variable (or a `.env` entry) takes
//! precedence over the stored key.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "ratecache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the stored API key
const API_KEY_ENV: &str = "CURRENCY_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if present (silently ignore if not found)
        let _ = dotenvy::dotenv();

        let path = Self::config_path()?;
        let mut config: Self = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.is_empty() {
                config.api_key = Some(key);
            }
        }

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the rate snapshot and preference files.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}
