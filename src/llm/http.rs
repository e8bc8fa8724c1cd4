//! OpenAI-compatible HTTP prompt client.
//!
//! Every registry provider exposes an OpenAI-style chat-completions
//! endpoint, so one request shape covers all of them; only the base URL and
//! API key differ per provider. Calls are bounded by a configurable timeout
//! (60s by default) and any failure surfaces as a [`PromptError`].

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{ModelId, Provider};
use crate::llm::{Message, PromptClient, PromptError};

/// Default per-call timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP [`PromptClient`] with per-provider key and base-URL routing.
#[derive(Debug, Clone)]
pub struct HttpPromptClient {
    http: reqwest::Client,
    api_keys: HashMap<Provider, String>,
    timeout_secs: u64,
    temperature: f64,
}

impl HttpPromptClient {
    /// Create a client with explicit API keys.
    pub fn new(api_keys: HashMap<Provider, String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_keys,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            temperature: 0.0,
        }
    }

    /// Create a client that reads API keys from the environment, keeping
    /// only the providers whose key variable is set.
    pub fn from_env() -> Self {
        let mut api_keys = HashMap::new();
        for provider in [
            Provider::Anthropic,
            Provider::OpenAI,
            Provider::Google,
            Provider::Groq,
            Provider::XAI,
            Provider::Perplexity,
        ] {
            if let Ok(key) = std::env::var(provider.api_key_env()) {
                if !key.is_empty() {
                    api_keys.insert(provider, key);
                }
            }
        }
        Self::new(api_keys)
    }

    /// Override the per-call timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Override the sampling temperature (0.0 by default).
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl PromptClient for HttpPromptClient {
    async fn invoke(&self, model: ModelId, messages: &[Message]) -> Result<String, PromptError> {
        let info = model.info();
        let api_key = self
            .api_keys
            .get(&info.provider)
            .ok_or(PromptError::MissingApiKey(info.provider.api_key_env()))?;

        let body = ChatRequest {
            model: info.model,
            messages,
            temperature: self.temperature,
        };

        log::debug!(
            "prompt call: model={} provider={:?} messages={}",
            info.model,
            info.provider,
            messages.len()
        );

        let response = self
            .http
            .post(format!("{}/chat/completions", info.provider.base_url()))
            .bearer_auth(api_key)
            .timeout(Duration::from_secs(self.timeout_secs))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PromptError::Timeout(self.timeout_secs)
                } else {
                    PromptError::Provider(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            log::warn!("prompt call failed: model={} status={}", info.model, status);
            return Err(PromptError::Provider(format!(
                "{} returned {}: {}",
                info.model, status, detail
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| PromptError::Provider(format!("malformed response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| PromptError::Provider("response contained no content".to_string()))
    }
}
