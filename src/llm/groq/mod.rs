
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::http::{build_agent, make_request_with_retry};
use crate::llm::{ChatMessage, ChatModel};
use crate::{RagError, Result};

/// Client for OpenAI-compatible `/chat/completions` endpoints such as Groq
#[derive(Clone)]
pub struct GroqClient {
    endpoint: Url,
    model: String,
    api_key: String,
    temperature: f32,
    agent: ureq::Agent,
    retry_attempts: u32,
}

impl std::fmt::Debug for GroqClient {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("temperature", &self.temperature)
            .field("retry_attempts", &self.retry_attempts)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl GroqClient {
    /// Build a client, reading the API key from the variable named by
    /// `llm.api_key_env`
    #[inline]
    pub fn new(config: &Config) -> Result<Self> {
        let var = &config.llm.api_key_env;
        let api_key = std::env::var(var)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                RagError::Config(format!(
                    "Environment variable {} is not set; it must hold the API key for {}",
                    var,
                    config.llm.provider
                ))
            })?;

        Self::with_api_key(config, api_key)
    }

    #[inline]
    pub fn with_api_key(config: &Config, api_key: impl Into<String>) -> Result<Self> {
        let base_url = config.llm_base_url()?;
        let endpoint = join_path(&base_url, "chat/completions")?;

        Ok(Self {
            endpoint,
            model: config.llm.model.clone(),
            api_key: api_key.into(),
            temperature: config.llm.temperature,
            agent: build_agent(Duration::from_secs(config.llm.timeout_seconds)),
            retry_attempts: config.http.retry_attempts,
        })
    }

    #[inline]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// Append `segment` to the path of `base`, keeping any path prefix such as `/openai/v1`
fn join_path(base: &Url, segment: &str) -> Result<Url> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(segment)
        .map_err(|e| RagError::Config(format!("Invalid chat endpoint {}{}: {}", base, segment, e)))
}

impl ChatModel for GroqClient {
    #[inline]
    fn model_name(&self) -> &str {
        &self.model
    }

    #[inline]
    fn complete(&self, messages: &[ChatMessage]) -> anyhow::Result<String> {
        let request = CompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
        };
        let request_json =
            serde_json::to_string(&request).context("Failed to serialize completion request")?;

        debug!(
            "Requesting completion from {} ({} messages)",
            self.endpoint,
            messages.len()
        );

        let authorization = format!("Bearer {}", self.api_key);
        let response_text =
            make_request_with_retry(self.endpoint.as_str(), self.retry_attempts, || {
                self.agent
                    .post(self.endpoint.as_str())
                    .header("Content-Type", "application/json")
                    .header("Authorization", authorization.as_str())
                    .send(&request_json)
                    .and_then(|mut resp| resp.body_mut().read_to_string())
            })
            .context("Chat completion request failed")?;

        let response: CompletionResponse = serde_json::from_str(&response_text)
            .context("Failed to parse chat completion response")?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow::anyhow!("Chat completion response contained no message"))
    }
}
