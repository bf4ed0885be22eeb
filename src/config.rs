//! Configuration management
//!
//! Completion model settings, the storage root and the HTTP listener.
//! Stored as TOML in the platform config directory; environment variables
//! override individual values at startup.

use anyhow::{Result, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Storage root override
pub const DATA_PATH_ENV: &str = "TECH_MENTOR_DATA_PATH";
/// Storage root override read when `TECH_MENTOR_DATA_PATH` is unset
pub const LEGACY_DATA_PATH_ENV: &str = "DATA_PATH";
/// HTTP port override
pub const PORT_ENV: &str = "PORT";
/// Completion model override
pub const MODEL_ENV: &str = "TECH_MENTOR_MODEL";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Completion provider settings
    #[serde(default)]
    pub llm: LlmConfig,
    /// Record store location
    #[serde(default)]
    pub storage: StorageConfig,
    /// HTTP listener
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmConfig {
    /// Model name sent with every completion request
    #[serde(default = "default_model")]
    pub model: String,
    /// OpenAI-compatible endpoint, overriding the provider's default
    #[serde(default)]
    pub base_url: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

fn default_model() -> String {
    "openai/gpt-4o-mini".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: None,
            timeout_secs: default_timeout_secs(),
            max_tokens: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Directory holding the JSON documents. Defaults to the platform data dir.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, writing defaults on
    /// first run, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&config_path()?)?;
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Load configuration from a specific file, creating it if missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let parent = path.parent()
            .context("Config path has no parent")?;

        std::fs::create_dir_all(parent)
            .context("Failed to create config directory")?;

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Apply `TECH_MENTOR_DATA_PATH` (falling back to `DATA_PATH`), `PORT`
    /// and `TECH_MENTOR_MODEL`.
    /// Blank values are ignored; an unparseable port is an error.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let non_empty = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(path) = non_empty(DATA_PATH_ENV).or_else(|| non_empty(LEGACY_DATA_PATH_ENV)) {
            self.storage.data_dir = Some(PathBuf::from(path));
        }
        if let Some(port) = non_empty(PORT_ENV) {
            self.server.port = port
                .parse()
                .with_context(|| format!("{} must be a port number, got '{}'", PORT_ENV, port))?;
        }
        if let Some(model) = non_empty(MODEL_ENV) {
            self.llm.model = model;
        }
        Ok(())
    }

    /// Directory the record store writes to
    pub fn storage_root(&self) -> Result<PathBuf> {
        match &self.storage.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => data_dir(),
        }
    }

    /// `host:port` for the HTTP listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "tech-mentor", "tech-mentor")
        .context("Failed to get project directories")
}

/// Get the configuration file path
pub fn config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("config.toml"))
}

/// Get the default data directory path
pub fn data_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}

/// Show current configuration
pub fn show_config() -> Result<()> {
    let config = Config::load()?;

    println!("Configuration ({})", config_path()?.display());
    println!("  model:        {}", config.llm.model);
    println!(
        "  endpoint:     {}",
        config.llm.base_url.as_deref().unwrap_or("provider default")
    );
    println!("  timeout:      {}s", config.llm.timeout_secs);
    if let Some(max_tokens) = config.llm.max_tokens {
        println!("  max tokens:   {}", max_tokens);
    }
    println!("  data dir:     {}", config.storage_root()?.display());
    println!("  listen:       {}", config.bind_address());
    println!(
        "  API key:      {}",
        if crate::security::has_api_key() { "configured" } else { "not configured" }
    );

    Ok(())
}

/// Set API key
pub fn set_api_key(key: &str) -> Result<()> {
    crate::security::set_api_key(key)?;
    println!("API key stored securely.");
    Ok(())
}

pub fn set_model(model: &str) -> Result<()> {
    let mut config = Config::load_from(&config_path()?)?;
    config.llm.model = model.to_string();
    config.save()?;
    println!("Model set to: {}", model);
    Ok(())
}

pub fn set_data_dir(path: &str) -> Result<()> {
    let mut config = Config::load_from(&config_path()?)?;
    config.storage.data_dir = Some(PathBuf::from(path));
    config.save()?;
    println!("Data directory set to: {}", path);
    Ok(())
}

/// Reset configuration to defaults
pub fn reset_config() -> Result<()> {
    let config = Config::default();
    config.save()?;
    println!("Configuration reset to defaults.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.llm.timeout_secs, 120);
        assert!(config.storage.data_dir.is_none());
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str("[llm]\nmodel = \"mistral/small\"\n").unwrap();
        assert_eq!(config.llm.model, "mistral/small");
        assert_eq!(config.llm.timeout_secs, 120);
        assert_eq!(config.server, ServerConfig::default());
    }

    #[test]
    fn test_load_from_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config, Config::default());

        let mut changed = config.clone();
        changed.server.port = 8080;
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().server.port, 8080);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env_overrides(env(&[
                (DATA_PATH_ENV, "/srv/mentor"),
                (PORT_ENV, "8081"),
                (MODEL_ENV, "openai/gpt-4o"),
            ]))
            .unwrap();

        assert_eq!(config.storage_root().unwrap(), PathBuf::from("/srv/mentor"));
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.llm.model, "openai/gpt-4o");
    }

    #[test]
    fn test_data_path_fallback() {
        let mut config = Config::default();
        config
            .apply_env_overrides(env(&[(LEGACY_DATA_PATH_ENV, "/var/lib/mentor")]))
            .unwrap();
        assert_eq!(config.storage_root().unwrap(), PathBuf::from("/var/lib/mentor"));

        let mut config = Config::default();
        config
            .apply_env_overrides(env(&[
                (DATA_PATH_ENV, "/srv/mentor"),
                (LEGACY_DATA_PATH_ENV, "/var/lib/mentor"),
            ]))
            .unwrap();
        assert_eq!(config.storage_root().unwrap(), PathBuf::from("/srv/mentor"));
    }

    #[test]
    fn test_blank_overrides_ignored_and_bad_port_rejected() {
        let mut config = Config::default();
        config.apply_env_overrides(env(&[(MODEL_ENV, "  ")])).unwrap();
        assert_eq!(config.llm.model, default_model());

        let err = config.apply_env_overrides(env(&[(PORT_ENV, "http")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
