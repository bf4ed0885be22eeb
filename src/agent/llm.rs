//! LLM client for OpenAI-compatible chat completion APIs (OpenRouter, OpenAI)

use anyhow::{Result, Context, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::TextCompletion;
use crate::config::Config;
use crate::security::Credential;

const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

// ============ Provider Configuration ============

/// Which API a credential belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenRouter,
    OpenAi,
}

/// Configuration for an LLM API provider
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Base URL for the API (e.g., "https://openrouter.ai/api/v1")
    pub base_url: String,
    /// API key for authentication
    pub api_key: String,
    /// Extra headers to include in requests (e.g., X-Title, HTTP-Referer)
    pub extra_headers: Vec<(String, String)>,
    /// Whether to include `transforms: []` in requests (OpenRouter-specific)
    pub include_transforms: bool,
}

impl ProviderConfig {
    /// Create an OpenRouter provider configuration
    pub fn openrouter(api_key: String) -> Self {
        Self {
            base_url: OPENROUTER_BASE_URL.to_string(),
            api_key,
            extra_headers: vec![
                ("HTTP-Referer".to_string(), "https://github.com/tech-mentor".to_string()),
                ("X-Title".to_string(), "Tech Mentor".to_string()),
            ],
            include_transforms: true,
        }
    }

    /// Create an OpenAI provider configuration
    pub fn openai(api_key: String) -> Self {
        Self {
            base_url: OPENAI_BASE_URL.to_string(),
            api_key,
            extra_headers: Vec::new(),
            include_transforms: false,
        }
    }

    pub fn for_credential(credential: &Credential) -> Self {
        match credential.provider {
            ProviderKind::OpenRouter => Self::openrouter(credential.api_key.clone()),
            ProviderKind::OpenAi => Self::openai(credential.api_key.clone()),
        }
    }

    /// Point the provider at a different OpenAI-compatible endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    transforms: Option<Vec<Value>>,
}

/// A single chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// LLM API client (OpenRouter by default, any OpenAI-compatible provider)
#[derive(Clone)]
pub struct OpenRouterClient {
    client: Arc<Client>,
    provider: ProviderConfig,
    model: String,
    max_tokens: Option<u32>,
}

impl OpenRouterClient {
    /// Create a client for a provider with an explicit model and request timeout
    pub fn with_provider(
        provider: ProviderConfig,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client: Arc::new(client),
            provider,
            model: model.into(),
            max_tokens: None,
        })
    }

    /// Create a client from configuration, resolving the credential
    /// from the environment or keyring
    pub fn from_config(config: &Config) -> Result<Self> {
        let credential = crate::security::resolve_credential()?;
        debug!("Using {:?} credential from {:?}", credential.provider, credential.source);

        let mut provider = ProviderConfig::for_credential(&credential);
        if let Some(base_url) = &config.llm.base_url {
            provider = provider.with_base_url(base_url);
        }

        let client = Self::with_provider(
            provider,
            config.llm.model.clone(),
            Duration::from_secs(config.llm.timeout_secs),
        )?;
        Ok(match config.llm.max_tokens {
            Some(max_tokens) => client.with_max_tokens(max_tokens),
            None => client,
        })
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a chat completion request
    pub async fn chat(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
        max_tokens: Option<u32>,
    ) -> Result<String> {
        let request = ChatRequest {
            model: model.to_string(),
            messages,
            max_tokens,
            transforms: if self.provider.include_transforms { Some(vec![]) } else { None },
        };

        let mut req_builder = self.client
            .post(format!("{}/chat/completions", self.provider.base_url))
            .header("Authorization", format!("Bearer {}", self.provider.api_key));
        for (key, value) in &self.provider.extra_headers {
            req_builder = req_builder.header(key.as_str(), value.as_str());
        }
        let response = req_builder
            .json(&request)
            .send()
            .await
            .context("Failed to send request to LLM provider")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("LLM API error ({}): {}", status, truncate_safe(&body, 500));
        }

        let body = response.text().await.context("Failed to read response body")?;

        let raw_response: Value = serde_json::from_str(&body)
            .map_err(|e| {
                anyhow::anyhow!("Failed to parse JSON response: {} (body: {})",
                    e, truncate_safe(&body, 500))
            })?;

        let content = extract_content(&raw_response);
        if content.trim().is_empty() {
            bail!("LLM provider returned an empty completion");
        }
        Ok(content)
    }
}

#[async_trait]
impl TextCompletion for OpenRouterClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let messages = vec![
            ChatMessage::system(system),
            ChatMessage::user(prompt),
        ];
        self.chat(&self.model, messages, self.max_tokens).await
    }
}

/// Pull the first choice's message text out of a chat completion response.
/// Handles both string content and array-of-content-parts formats.
pub fn extract_content(response: &Value) -> String {
    let content_value = response
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|msg| msg.get("content"));

    match content_value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(parts)) => {
            parts.iter().filter_map(|part| {
                if part.get("type").and_then(|t| t.as_str()) == Some("text") {
                    part.get("text").and_then(|t| t.as_str()).map(|s| s.to_string())
                } else {
                    None
                }
            }).collect::<Vec<_>>().join("")
        }
        _ => String::new(),
    }
}

/// Truncate to at most `max` bytes without splitting a UTF-8 character
pub fn truncate_safe(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
