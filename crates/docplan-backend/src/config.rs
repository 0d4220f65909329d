//! Backend configuration.
//!
//! Precedence: defaults, then a TOML file, then `DOCPLAN_*` environment
//! variables.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_MODEL_NAME: &str = "PipableAI/pip-library-etl-1.3b";
pub const DEFAULT_REMOTE_URL: &str = "https://playground.pipable.ai/infer";
pub const DEFAULT_LOCAL_URL: &str = "http://localhost:11434/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Which backend implementation serves generation requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// Hosted inference service speaking the `model_name`/`prompt`/`max_new_tokens` contract.
    #[default]
    Remote,
    /// Model served on this machine through an OpenAI-compatible endpoint.
    Local,
}

impl fmt::Display for BackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendMode::Remote => write!(f, "remote"),
            BackendMode::Local => write!(f, "local"),
        }
    }
}

impl FromStr for BackendMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remote" | "cloud" => Ok(BackendMode::Remote),
            "local" => Ok(BackendMode::Local),
            other => Err(ConfigError::invalid(
                "mode",
                format!("expected `remote` or `local`, got `{other}`"),
            )),
        }
    }
}

/// Connection settings for a generation backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub mode: BackendMode,

    /// Model identifier sent to the backend.
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Endpoint override; the mode's default is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Bearer token for local OpenAI-compatible servers.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model_name() -> String {
    DEFAULT_MODEL_NAME.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            mode: BackendMode::default(),
            model_name: default_model_name(),
            url: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl BackendConfig {
    /// Load from the platform config file (if present), then apply the
    /// process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let config = match Self::config_file_path() {
            Some(path) if path.exists() => Self::load_from_toml(&path)?,
            _ => Self::default(),
        };
        config.apply_env()
    }

    /// Parse a TOML file with the same fields as [`BackendConfig`].
    pub fn load_from_toml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&raw)?)
    }

    /// Apply `DOCPLAN_*` overrides from the process environment.
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mode) = lookup("DOCPLAN_MODE") {
            self.mode = mode.parse()?;
        }
        if let Some(model) = lookup("DOCPLAN_MODEL") {
            self.model_name = model;
        }
        if let Some(url) = lookup("DOCPLAN_URL") {
            self.url = Some(url);
        }
        if let Some(key) = lookup("DOCPLAN_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(timeout) = lookup("DOCPLAN_TIMEOUT_SECS") {
            self.timeout_secs = timeout
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid("timeout_secs", format!("not a number: {timeout}")))?;
        }
        Ok(self)
    }

    /// Location of the user-level config file.
    pub fn config_file_path() -> Option<PathBuf> {
        ProjectDirs::from("dev", "docplan", "docplan")
            .map(|dirs| dirs.config_dir().join("backend.toml"))
    }

    /// Endpoint the configured mode talks to.
    pub fn endpoint(&self) -> &str {
        match (&self.url, self.mode) {
            (Some(url), _) => url,
            (None, BackendMode::Remote) => DEFAULT_REMOTE_URL,
            (None, BackendMode::Local) => DEFAULT_LOCAL_URL,
        }
    }

    /// Bounded request timeout. Zero is rejected: every HTTP call must be able
    /// to give up.
    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::invalid("timeout_secs", "must be greater than zero"));
        }
        Ok(Duration::from_secs(self.timeout_secs))
    }

    /// Get a configuration value by key. Secrets are masked.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "mode" => Some(self.mode.to_string()),
            "model_name" => Some(self.model_name.clone()),
            "url" => Some(self.endpoint().to_string()),
            "api_key" => self.api_key.as_ref().map(|_| "***".to_string()),
            "timeout_secs" => Some(self.timeout_secs.to_string()),
            _ => None,
        }
    }

    /// Set a configuration value by key.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "mode" => self.mode = value.parse()?,
            "model_name" => self.model_name = value.to_string(),
            "url" => self.url = Some(value.to_string()),
            "api_key" => self.api_key = Some(value.to_string()),
            "timeout_secs" => {
                self.timeout_secs = value
                    .parse()
                    .map_err(|_| ConfigError::invalid("timeout_secs", format!("not a number: {value}")))?;
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    /// Render as TOML. The API key is never written.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save to the platform config file.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::config_file_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, self.to_toml()?).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}
