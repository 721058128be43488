//! Configuration for the dashboard front end.
//!
//! Settings come from `<config dir>/adoption/config.yaml` when it exists,
//! then environment variables override individual fields. Every field has
//! a default, so a partial file (or none) is fine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::dataset::DEFAULT_DATA_URL;
use crate::error::ConfigError;
use crate::query::capability::{
  SessionOptions, DEFAULT_POLL_INTERVAL, DEFAULT_TEMPERATURE, DEFAULT_TOP_K,
};

pub const HOME_ENV: &str = "ADOPTION_HOME";
pub const DATA_URL_ENV: &str = "ADOPTION_DATA_URL";
pub const MODEL_URL_ENV: &str = "ADOPTION_MODEL_URL";
pub const MODEL_NAME_ENV: &str = "ADOPTION_MODEL";
pub const TIMEOUT_ENV: &str = "ADOPTION_TIMEOUT_SECS";

const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
  /// Dataset location: an http(s) URL or a local file path
  #[serde(default = "default_data_url")]
  pub data_url: String,
  /// Timeout for the dataset fetch and every model request
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
  #[serde(default)]
  pub model: ModelConfig,
}

/// Local language model endpoint used for natural-language search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
  #[serde(default = "default_model_url")]
  pub base_url: String,
  #[serde(default = "default_model_name")]
  pub name: String,
  #[serde(default = "default_temperature")]
  pub temperature: f32,
  #[serde(default = "default_top_k")]
  pub top_k: u32,
  #[serde(default = "default_poll_interval_secs")]
  pub poll_interval_secs: u64,
}

fn default_data_url() -> String {
  DEFAULT_DATA_URL.to_string()
}
fn default_timeout_secs() -> u64 {
  30
}
fn default_model_url() -> String {
  "http://localhost:11434".to_string()
}
fn default_model_name() -> String {
  "gemma3:1b".to_string()
}
fn default_temperature() -> f32 {
  DEFAULT_TEMPERATURE
}
fn default_top_k() -> u32 {
  DEFAULT_TOP_K
}
fn default_poll_interval_secs() -> u64 {
  DEFAULT_POLL_INTERVAL.as_secs()
}

impl Default for ModelConfig {
  fn default() -> Self {
    Self {
      base_url: default_model_url(),
      name: default_model_name(),
      temperature: default_temperature(),
      top_k: default_top_k(),
      poll_interval_secs: default_poll_interval_secs(),
    }
  }
}

impl Default for Config {
  fn default() -> Self {
    Self {
      data_url: default_data_url(),
      timeout_secs: default_timeout_secs(),
      model: ModelConfig::default(),
    }
  }
}

impl Config {
  /// Load from the default location, then apply environment overrides
  pub fn load() -> Result<Self, ConfigError> {
    let path = config_path()?;
    Self::load_from_file(&path)?.apply_overrides(|name| std::env::var(name).ok())
  }

  /// A missing file yields defaults; an unreadable or invalid one is an error
  pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
    if !path.exists() {
      return Ok(Self::default());
    }

    let content = std::fs::read_to_string(path)
      .map_err(|e| ConfigError::read_failed(path.display().to_string(), e.to_string()))?;
    if content.trim().is_empty() {
      return Ok(Self::default());
    }

    serde_yaml::from_str(&content)
      .map_err(|e| ConfigError::invalid(path.display().to_string(), e.to_string()))
  }

  pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
  where
    F: Fn(&str) -> Option<String>,
  {
    if let Some(url) = lookup(DATA_URL_ENV) {
      self.data_url = url;
    }
    if let Some(url) = lookup(MODEL_URL_ENV) {
      self.model.base_url = url;
    }
    if let Some(name) = lookup(MODEL_NAME_ENV) {
      self.model.name = name;
    }
    if let Some(raw) = lookup(TIMEOUT_ENV) {
      self.timeout_secs =
        raw.trim().parse().map_err(|_| ConfigError::invalid_env(TIMEOUT_ENV, raw.clone()))?;
    }
    Ok(self)
  }

  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }
}

impl ModelConfig {
  pub fn session_options(&self) -> SessionOptions {
    SessionOptions { temperature: self.temperature, top_k: self.top_k, monitor: None }
  }

  pub fn poll_interval(&self) -> Duration {
    Duration::from_secs(self.poll_interval_secs.max(1))
  }
}

/// Directory holding `config.yaml`. `ADOPTION_HOME` overrides it.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
  if let Ok(home) = std::env::var(HOME_ENV) {
    return Ok(PathBuf::from(home));
  }
  let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
  Ok(base.join("adoption"))
}

pub fn config_path() -> Result<PathBuf, ConfigError> {
  Ok(config_dir()?.join(CONFIG_FILE))
}

/// Directory holding persisted query history. `ADOPTION_HOME` overrides it.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
  if let Ok(home) = std::env::var(HOME_ENV) {
    return Ok(PathBuf::from(home));
  }
  let base = dirs::data_dir().ok_or(ConfigError::NoConfigDir)?;
  Ok(base.join("adoption"))
}
