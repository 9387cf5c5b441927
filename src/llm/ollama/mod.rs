
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::http::{build_agent, make_request_with_retry};
use crate::llm::{ChatMessage, ChatModel};
use crate::{RagError, Result};

/// Chat client for Ollama's `/api/chat`
#[derive(Debug, Clone)]
pub struct OllamaChatClient {
    endpoint: Url,
    model: String,
    temperature: f32,
    agent: ureq::Agent,
    retry_attempts: u32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

impl OllamaChatClient {
    #[inline]
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = config.llm_base_url()?;
        let endpoint = base_url
            .join("/api/chat")
            .map_err(|e| RagError::Config(format!("Invalid Ollama chat URL: {}", e)))?;

        Ok(Self {
            endpoint,
            model: config.llm.model.clone(),
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

impl ChatModel for OllamaChatClient {
    #[inline]
    fn model_name(&self) -> &str {
        &self.model
    }

    #[inline]
    fn complete(&self, messages: &[ChatMessage]) -> anyhow::Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            stream: false,
            options: ChatOptions {
                temperature: self.temperature,
            },
        };
        let request_json =
            serde_json::to_string(&request).context("Failed to serialize chat request")?;

        debug!("Requesting chat from {} with model {}", self.endpoint, self.model);

        let response_text =
            make_request_with_retry(self.endpoint.as_str(), self.retry_attempts, || {
                self.agent
                    .post(self.endpoint.as_str())
                    .header("Content-Type", "application/json")
                    .send(&request_json)
                    .and_then(|mut resp| resp.body_mut().read_to_string())
            })
            .context("Ollama chat request failed")?;

        let response: ChatResponse =
            serde_json::from_str(&response_text).context("Failed to parse Ollama chat response")?;

        Ok(response.message.content)
    }
}
