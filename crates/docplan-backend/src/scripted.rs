use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::{BackendError, BackendResult};
use crate::GenerationBackend;

/// Replays queued responses in order and records every prompt it receives.
///
/// Useful for tests and for replaying captured model output offline.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    responses: Mutex<VecDeque<BackendResult<String>>>,
    prompts: Mutex<Vec<(String, usize)>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that answers each call with the next string from `responses`.
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let backend = Self::new();
        for response in responses {
            backend.push_response(response);
        }
        backend
    }

    pub fn push_response(&self, response: impl Into<String>) {
        self.lock_responses().push_back(Ok(response.into()));
    }

    pub fn push_error(&self, error: BackendError) {
        self.lock_responses().push_back(Err(error));
    }

    /// Prompts and token budgets received so far.
    pub fn prompts(&self) -> Vec<(String, usize)> {
        self.prompts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn remaining(&self) -> usize {
        self.lock_responses().len()
    }

    fn lock_responses(&self) -> std::sync::MutexGuard<'_, VecDeque<BackendResult<String>>> {
        self.responses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl GenerationBackend for ScriptedBackend {
    fn generate(&self, prompt: &str, max_tokens: usize) -> BackendResult<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((prompt.to_string(), max_tokens));
        self.lock_responses()
            .pop_front()
            .unwrap_or(Err(BackendError::Exhausted))
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}
