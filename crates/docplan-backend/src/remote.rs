use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::config::BackendConfig;
use crate::error::{BackendError, BackendResult};
use crate::GenerationBackend;

/// Hosted inference service.
///
/// Posts form fields `model_name`, `prompt` and `max_new_tokens`; a 200 reply
/// carries the generated text in the JSON field `response`.
#[derive(Debug, Clone)]
pub struct RemoteBackend {
    client: Client,
    url: String,
    model_name: String,
}

#[derive(Debug, Deserialize)]
struct InferenceResponse {
    response: String,
}

impl RemoteBackend {
    pub fn new(
        url: impl Into<String>,
        model_name: impl Into<String>,
        timeout: Duration,
    ) -> BackendResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(BackendError::ClientBuild)?;

        Ok(Self {
            client,
            url: url.into(),
            model_name: model_name.into(),
        })
    }

    pub fn from_config(config: &BackendConfig) -> BackendResult<Self> {
        Self::new(config.endpoint(), &config.model_name, config.timeout()?)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl GenerationBackend for RemoteBackend {
    fn generate(&self, prompt: &str, max_tokens: usize) -> BackendResult<String> {
        debug!(
            target: "docplan::backend",
            url = %self.url,
            model = %self.model_name,
            prompt_chars = prompt.len(),
            max_tokens,
            "remote_generate_start"
        );

        let max_new_tokens = max_tokens.to_string();
        let form = [
            ("model_name", self.model_name.as_str()),
            ("prompt", prompt),
            ("max_new_tokens", max_new_tokens.as_str()),
        ];

        let response = self
            .client
            .post(&self.url)
            .form(&form)
            .send()
            .map_err(|source| BackendError::Transport {
                endpoint: self.url.clone(),
                source,
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().unwrap_or_default();
            return Err(BackendError::Status {
                endpoint: self.url.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let payload: InferenceResponse =
            response
                .json()
                .map_err(|err| BackendError::MalformedResponse {
                    endpoint: self.url.clone(),
                    message: err.to_string(),
                })?;

        debug!(target: "docplan::backend", chars = payload.response.len(), "remote_generate_complete");
        Ok(payload.response)
    }

    fn describe(&self) -> String {
        format!("remote {} ({})", self.url, self.model_name)
    }
}
