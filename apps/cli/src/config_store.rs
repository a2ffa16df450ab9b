//! JSON config file owned by the shell.

use std::fs;
use std::path::{Path, PathBuf};

use bbot_core::{Config, Result};

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const BINANCE_API_KEY: &str = "BINANCE_API_KEY";
pub const BINANCE_API_SECRET: &str = "BINANCE_API_SECRET";

pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and validate the file. A missing file yields the defaults.
    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            tracing::info!(
                "Config file {} not found, using defaults",
                self.path.display()
            );
            return Ok(Config::default());
        }
        let raw = fs::read_to_string(&self.path)?;
        Config::from_json_str(&raw)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        config.validate()?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, config.to_json_pretty()?)?;
        tracing::info!("Config saved to {}", self.path.display());
        Ok(())
    }
}

/// Credentials from the environment win over the file. Blank values are ignored.
pub fn apply_env_overrides<F>(mut config: Config, lookup: F) -> Config
where
    F: Fn(&str) -> Option<String>,
{
    let value = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(key) = value(OPENAI_API_KEY) {
        config.api_keys.openai_key = key;
    }
    if let Some(key) = value(BINANCE_API_KEY) {
        config.api_keys.exchange_key = key;
    }
    if let Some(secret) = value(BINANCE_API_SECRET) {
        config.api_keys.exchange_secret = secret;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use bbot_core::{ConfigUpdate, Error};
    use std::collections::HashMap;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("config.json"));
        assert_eq!(store.load().unwrap(), Config::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("nested").join("config.json"));
        let config = Config::default().apply(&ConfigUpdate {
            active_pair: Some("ETHUSDT".to_string()),
            manual_fee_free: Some(vec!["ETHUSDT".to_string()]),
            ..Default::default()
        });

        store.save(&config).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded, config);
        assert_eq!(loaded.app.active_pair, "ETHUSDT");
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"app": {"mode": "paper"}}"#).unwrap();

        let err = ConfigStore::new(&path).load().unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (OPENAI_API_KEY, "sk-env"),
            (BINANCE_API_KEY, "  "),
            (BINANCE_API_SECRET, "secret"),
        ]);
        let mut config = Config::default();
        config.api_keys.exchange_key = "file-key".to_string();

        let config = apply_env_overrides(config, |name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.api_keys.openai_key, "sk-env");
        assert_eq!(config.api_keys.exchange_key, "file-key");
        assert_eq!(config.api_keys.exchange_secret, "secret");
    }
}
