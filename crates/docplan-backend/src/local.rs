use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::BackendConfig;
use crate::error::{BackendError, BackendResult};
use crate::GenerationBackend;

/// Model served on this machine (Ollama, llama.cpp server, vLLM, ...)
/// through an OpenAI-compatible `/chat/completions` endpoint.
///
/// Chat endpoints return only the completion. The prompt is prepended so the
/// result reads like a decoded generation, prompt included.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    model_name: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: String,
}

impl LocalBackend {
    pub fn new(
        api_url: impl Into<String>,
        model_name: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> BackendResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(BackendError::ClientBuild)?;

        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key,
            model_name: model_name.into(),
        })
    }

    pub fn from_config(config: &BackendConfig) -> BackendResult<Self> {
        Self::new(
            config.endpoint(),
            &config.model_name,
            config.api_key.clone(),
            config.timeout()?,
        )
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_url.trim_end_matches('/'))
    }

    fn headers(&self) -> BackendResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {key}")).map_err(|err| {
                BackendError::Model(format!("invalid api key header: {err}"))
            })?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }
}

impl GenerationBackend for LocalBackend {
    fn generate(&self, prompt: &str, max_tokens: usize) -> BackendResult<String> {
        let url = self.completions_url();
        debug!(
            target: "docplan::backend",
            url = %url,
            model = %self.model_name,
            prompt_chars = prompt.len(),
            max_tokens,
            "local_generate_start"
        );

        let body = json!({
            "model": self.model_name,
            "messages": [{"role": "user", "content": prompt}],
            "max_tokens": max_tokens,
        });

        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .map_err(|source| BackendError::Transport {
                endpoint: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(BackendError::Status {
                endpoint: url,
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletionResponse =
            response
                .json()
                .map_err(|err| BackendError::MalformedResponse {
                    endpoint: url.clone(),
                    message: err.to_string(),
                })?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| BackendError::MalformedResponse {
                endpoint: url,
                message: "response has no choices".to_string(),
            })?;

        debug!(target: "docplan::backend", chars = content.len(), "local_generate_complete");
        Ok(format!("{prompt}{content}"))
    }

    fn describe(&self) -> String {
        format!("local {} ({})", self.api_url, self.model_name)
    }
}
