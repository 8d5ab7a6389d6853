//! Remote completion backends
//!
//! A backend turns one prompt into one reply. No history is sent; each turn is
//! stateless from the service's point of view.
//!
//! - `ProxyBackend` - POSTs `{ message }` to a proxy answering `{ reply }`
//! - `GroqBackend` - calls Groq's OpenAI-compatible chat completions API directly

use crate::config::Settings;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const GROQ_DEFAULT_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const GROQ_DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("completion endpoint error {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(
        "No completion backend configured. Set KESTREL_ENDPOINT for a proxy or GROQ_API_KEY for Groq."
    )]
    NotConfigured,
}

pub type CompletionResult<T> = Result<T, CompletionError>;

#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> CompletionResult<String>;
}

pub type SharedBackend = Arc<dyn CompletionBackend>;

/// Pick a backend from settings. Priority: proxy endpoint, then Groq key.
/// With neither set every turn fails with `NotConfigured`.
pub fn backend_from_settings(settings: &Settings) -> SharedBackend {
    if let Some(endpoint) = &settings.proxy_endpoint {
        tracing::info!(%endpoint, "using completion proxy");
        return Arc::new(ProxyBackend::new(endpoint.clone()));
    }

    if let Some(key) = &settings.groq_api_key {
        tracing::info!(model = %settings.groq_model, "using Groq completions");
        return Arc::new(GroqBackend::new(
            settings.groq_endpoint.clone(),
            settings.groq_model.clone(),
            key.clone(),
        ));
    }

    tracing::warn!("no completion backend configured");
    Arc::new(Unconfigured)
}

// ============================================
// Proxy backend
// ============================================

pub struct ProxyBackend {
    endpoint: String,
    client: Client,
}

impl ProxyBackend {
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            client: Client::new(),
        }
    }
}

#[derive(Serialize)]
struct ProxyRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct ProxyResponse {
    #[serde(default)]
    reply: String,
}

#[async_trait]
impl CompletionBackend for ProxyBackend {
    async fn complete(&self, prompt: &str) -> CompletionResult<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ProxyRequest { message: prompt })
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(CompletionError::Status { status, body });
        }

        let parsed: ProxyResponse = serde_json::from_str(&body)?;
        Ok(parsed.reply)
    }
}

// ============================================
// Groq backend
// ============================================

pub struct GroqBackend {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

#[derive(Serialize)]
struct GroqRequest<'a> {
    model: &'a str,
    messages: [GroqMessage<'a>; 1],
}

#[derive(Serialize)]
struct GroqMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct GroqReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct GroqChoice {
    message: Option<GroqReply>,
}

#[derive(Deserialize)]
struct GroqResponse {
    #[serde(default)]
    choices: Vec<GroqChoice>,
}

impl GroqBackend {
    pub fn new(endpoint: String, model: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            model,
            api_key,
        }
    }
}

#[async_trait]
impl CompletionBackend for GroqBackend {
    async fn complete(&self, prompt: &str) -> CompletionResult<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&GroqRequest {
                model: &self.model,
                messages: [GroqMessage {
                    role: "user",
                    content: prompt,
                }],
            })
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(CompletionError::Status { status, body });
        }

        // A missing first choice or null content counts as an empty reply.
        let parsed: GroqResponse = serde_json::from_str(&body)?;
        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_default())
    }
}

struct Unconfigured;

#[async_trait]
impl CompletionBackend for Unconfigured {
    async fn complete(&self, _prompt: &str) -> CompletionResult<String> {
        Err(CompletionError::NotConfigured)
    }
}
