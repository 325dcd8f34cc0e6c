//! Application configuration management.
//!
//! This module handles loading and saving the client configuration,
//! which includes the backend URL override and the last used sign-in
//! email.
//!
//! Configuration is stored at `~/.config/agentdeck/config.json`.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::api::DEFAULT_BASE_URL;

/// Application name used for config directory paths
const APP_NAME: &str = "agentdeck";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the backend base URL
const API_URL_ENV: &str = "AGENTDECK_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_url: Option<String>,
    pub last_email: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
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

    /// Backend base URL: environment override, then config file, then
    /// the local development default.
    pub fn resolve_api_url(&self) -> String {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.is_empty() {
                return url;
            }
        }
        self.api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }
}
