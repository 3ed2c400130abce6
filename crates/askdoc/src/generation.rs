//! LLM answer generation over an OpenAI-compatible chat completions API.
//!
//! The [`Generator`] trait is the seam the RAG engine talks through;
//! [`OpenAiCompatGenerator`] is the HTTP implementation. Any failure here
//! surfaces as [`Error::Generation`], which the engine treats as a signal
//! to fall back to local extractive answering rather than erroring out.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use askdoc_core::{Error, Result};

use crate::config::GenerationConfig;

/// Produces an answer from a fully templated prompt.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Chat-completions client for OpenAI-compatible endpoints.
pub struct OpenAiCompatGenerator {
    client: reqwest::Client,
    config: GenerationConfig,
}

impl OpenAiCompatGenerator {
    pub fn new(config: GenerationConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Generation(format!("build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn api_key(&self) -> Result<String> {
        std::env::var(&self.config.api_key_env).map_err(|_| {
            Error::Generation(format!(
                "API key not set (expected in environment variable {})",
                self.config.api_key_env
            ))
        })
    }
}

#[async_trait]
impl Generator for OpenAiCompatGenerator {
    /// The whole templated prompt travels as a single user message.
    async fn generate(&self, prompt: &str) -> Result<String> {
        let api_key = self.api_key()?;
        let url = format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        );
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            stream: false,
        };

        debug!(model = %self.config.model, "requesting chat completion");
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Generation(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Generation(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Generation(format!("invalid response body: {}", e)))?;
        let content = parsed
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| Error::Generation("response contained no choices".to_string()))?;
        if content.is_empty() {
            return Err(Error::Generation("response content was empty".to_string()));
        }
        Ok(content)
    }
}
