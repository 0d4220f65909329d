//! Error types for generation backends.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors raised while producing text from a backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The HTTP client could not be constructed.
    #[error("failed to build http client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// The request never produced a response (connect, timeout, TLS, ...).
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("{endpoint} responded with status {status}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The service answered 200 but the payload was not usable.
    #[error("malformed response from {endpoint}: {message}")]
    MalformedResponse { endpoint: String, message: String },

    /// An in-process model reported a failure.
    #[error("model invocation failed: {0}")]
    Model(String),

    /// A scripted backend ran out of queued responses.
    #[error("scripted backend has no response left")]
    Exhausted,

    /// Backend configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl BackendError {
    /// HTTP status when the failure came from a non-success response.
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors raised while loading or validating [`crate::BackendConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config toml: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unable to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("no platform config directory available")]
    NoConfigDir,

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("unknown config key: {0}")]
    UnknownKey(String),
}

impl ConfigError {
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}
