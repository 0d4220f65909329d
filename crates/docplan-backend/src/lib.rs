//! Generation backends for docplan.
//!
//! Every component that talks to a language model does so through
//! [`GenerationBackend`]: a prompt and a token budget go in, raw text comes
//! out. Callers never need to know which implementation is active.
//!
//! - [`RemoteBackend`]: hosted inference service (`model_name`, `prompt`,
//!   `max_new_tokens` form fields; `response` JSON field on success).
//! - [`LocalBackend`]: model served on this machine through an
//!   OpenAI-compatible endpoint.
//! - [`FnBackend`]: wraps an in-process model behind a closure.
//! - [`ScriptedBackend`]: replays queued responses.
//!
//! Calls are blocking. A backend holds a single HTTP client or model handle
//! and should be owned by one generator/planner; concurrent sessions each hold
//! their own instance.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

mod config;
mod error;
mod local;
mod remote;
mod scripted;

pub use config::{
    BackendConfig, BackendMode, DEFAULT_LOCAL_URL, DEFAULT_MODEL_NAME, DEFAULT_REMOTE_URL,
    DEFAULT_TIMEOUT_SECS,
};
pub use error::{BackendError, BackendResult, ConfigError};
pub use local::LocalBackend;
pub use remote::RemoteBackend;
pub use scripted::ScriptedBackend;

/// Opaque text-generation service.
pub trait GenerationBackend: Send + Sync {
    /// Produce raw text for `prompt`, generating at most `max_tokens` new tokens.
    fn generate(&self, prompt: &str, max_tokens: usize) -> BackendResult<String>;

    /// Short human-readable identification for logs.
    fn describe(&self) -> String {
        "backend".to_string()
    }
}

impl<B: GenerationBackend + ?Sized> GenerationBackend for Box<B> {
    fn generate(&self, prompt: &str, max_tokens: usize) -> BackendResult<String> {
        (**self).generate(prompt, max_tokens)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<B: GenerationBackend + ?Sized> GenerationBackend for &B {
    fn generate(&self, prompt: &str, max_tokens: usize) -> BackendResult<String> {
        (**self).generate(prompt, max_tokens)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<B: GenerationBackend + ?Sized> GenerationBackend for Arc<B> {
    fn generate(&self, prompt: &str, max_tokens: usize) -> BackendResult<String> {
        (**self).generate(prompt, max_tokens)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// In-process model behind a closure.
pub struct FnBackend<F> {
    name: String,
    generate: F,
}

impl<F> FnBackend<F>
where
    F: Fn(&str, usize) -> BackendResult<String> + Send + Sync,
{
    pub fn new(name: impl Into<String>, generate: F) -> Self {
        Self {
            name: name.into(),
            generate,
        }
    }
}

impl<F> GenerationBackend for FnBackend<F>
where
    F: Fn(&str, usize) -> BackendResult<String> + Send + Sync,
{
    fn generate(&self, prompt: &str, max_tokens: usize) -> BackendResult<String> {
        (self.generate)(prompt, max_tokens)
    }

    fn describe(&self) -> String {
        format!("in-process {}", self.name)
    }
}

impl<F> fmt::Debug for FnBackend<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnBackend").field("name", &self.name).finish()
    }
}

/// Build the backend selected by `config`.
pub fn create_backend(config: &BackendConfig) -> BackendResult<Box<dyn GenerationBackend>> {
    debug!(mode = %config.mode, model = %config.model_name, "create_backend: called");
    match config.mode {
        BackendMode::Remote => Ok(Box::new(RemoteBackend::from_config(config)?)),
        BackendMode::Local => Ok(Box::new(LocalBackend::from_config(config)?)),
    }
}
