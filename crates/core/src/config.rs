//! Application configuration.
//!
//! Settings are layered: compiled-in defaults, then the user config file,
//! then the `GAME_API_KEY` environment variable for the credential. A
//! commented default file is written on first run so the key has an
//! obvious home.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::ConfigError;

/// Compiled-in fallback credential. Deliberately empty: an empty key is
/// rejected before any network call is made.
const FALLBACK_API_KEY: &str = "";

/// Default catalog endpoint (RAWG-compatible).
const DEFAULT_BASE_URL: &str = "https://api.rawg.io/api/games";

/// Default log directory, relative to the working directory.
const DEFAULT_LOG_DIR: &str = "logs";

const DEFAULT_CONFIG_TEMPLATE: &str = r#"# gamedeck configuration.

# Credential for the catalog API. The GAME_API_KEY environment variable
# takes precedence over this value when set and non-empty.
api_key = ""

# Catalog endpoint; any RAWG-compatible API works.
api_base_url = "https://api.rawg.io/api/games"

# Directory receiving the append-only log file. Relative paths resolve
# against the working directory.
log_dir = "logs"
"#;

/// User-tunable settings for the catalog browser.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Catalog API endpoint.
    pub api_base_url: String,
    /// API credential after file/env/fallback layering.
    pub api_key: String,
    /// Directory receiving the append-only log file.
    pub log_dir: PathBuf,
}

impl AppConfig {
    /// Load settings from the default config path and the environment.
    pub fn load() -> Result<Self> {
        let loaded = Self::load_from(&config_path()?)?;
        Ok(loaded.apply_env_key(env::var("GAME_API_KEY").ok()))
    }

    /// Load settings from a specific file, without environment overrides.
    /// The file may be absent; defaults then apply.
    pub fn load_from(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("api_base_url", DEFAULT_BASE_URL)?
            .set_default("api_key", FALLBACK_API_KEY)?
            .set_default("log_dir", DEFAULT_LOG_DIR)?
            .add_source(config::File::from(path.to_path_buf()).required(false))
            .build()
            .with_context(|| format!("failed to read config {}", path.display()))?;

        settings
            .try_deserialize()
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    /// Return the credential, or the configuration error that is terminal
    /// for the startup flow.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        let key = self.api_key.trim();
        if key.is_empty() {
            Err(ConfigError::MissingApiKey)
        } else {
            Ok(key)
        }
    }

    fn apply_env_key(mut self, key: Option<String>) -> Self {
        if let Some(key) = key.filter(|value| !value.trim().is_empty()) {
            self.api_key = key;
        }
        self
    }
}

/// Write a commented default config file if none exists yet.
pub fn ensure_default_config() -> Result<()> {
    let path = config_path()?;
    if path.exists() {
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(&path, DEFAULT_CONFIG_TEMPLATE)
        .with_context(|| format!("failed to write default config {}", path.display()))
}

/// Path of the user config file.
pub fn config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("no user configuration directory available")?;
    Ok(base.join("gamedeck").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn defaults() -> AppConfig {
        let dir = tempdir().expect("tempdir");
        AppConfig::load_from(&dir.path().join("missing.toml")).expect("defaults load")
    }

    #[test]
    fn missing_file_yields_defaults_with_empty_key() {
        let config = defaults();
        assert_eq!(config.api_base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api_key, "");
        assert_eq!(config.log_dir, PathBuf::from(DEFAULT_LOG_DIR));
        assert_eq!(config.require_api_key(), Err(ConfigError::MissingApiKey));
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "api_key = \"file-key\"\napi_base_url = \"http://localhost:9/games\"\n",
        )
        .expect("write config");

        let config = AppConfig::load_from(&path).expect("load");
        assert_eq!(config.api_key, "file-key");
        assert_eq!(config.api_base_url, "http://localhost:9/games");
        assert_eq!(config.require_api_key(), Ok("file-key"));
    }

    #[test]
    fn env_key_wins_over_file_key() {
        let config = defaults().apply_env_key(Some("env-key".to_string()));
        assert_eq!(config.require_api_key(), Ok("env-key"));
    }

    #[test]
    fn blank_env_key_is_ignored() {
        let mut config = defaults();
        config.api_key = "file-key".to_string();
        let config = config.apply_env_key(Some("   ".to_string()));
        assert_eq!(config.require_api_key(), Ok("file-key"));
    }
}
