//! Inference client: the single point of entry for text-generation calls.
//!
//! No other module talks to a provider directly. The provider is chosen by
//! configuration; its response envelope is normalized in `envelope` so the
//! rest of the service only ever sees a `RawCompletion`.
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

pub mod envelope;
pub mod retry;

pub use retry::{RetryPolicy, RetryingClient};

const HUGGINGFACE_DEFAULT_URL: &str = "https://api-inference.huggingface.co/models/gpt2";
const OPENAI_DEFAULT_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Model is currently loading")]
    ModelLoading { estimated_time: Option<f64> },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unrecognized provider response: {0}")]
    UnrecognizedEnvelope(String),
}

impl InferenceError {
    pub fn is_model_loading(&self) -> bool {
        matches!(self, InferenceError::ModelLoading { .. })
    }
}

/// Text-generation backend a deployment talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// HuggingFace Inference API: `{"inputs": ...}` in, `[{"generated_text": ...}]` out.
    HuggingFace,
    /// OpenAI-compatible chat completions.
    OpenAi,
}

impl Provider {
    pub fn default_url(&self) -> &'static str {
        match self {
            Provider::HuggingFace => HUGGINGFACE_DEFAULT_URL,
            Provider::OpenAi => OPENAI_DEFAULT_URL,
        }
    }

    /// Environment variable holding the bearer credential for this provider.
    pub fn credential_var(&self) -> &'static str {
        match self {
            Provider::HuggingFace => "HUGGINGFACE_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::HuggingFace => f.write_str("huggingface"),
            Provider::OpenAi => f.write_str("openai"),
        }
    }
}

impl FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "huggingface" | "hf" => Ok(Provider::HuggingFace),
            "openai" | "chat" => Ok(Provider::OpenAi),
            other => Err(anyhow!(
                "Unknown INFERENCE_PROVIDER '{other}' (expected 'huggingface' or 'openai')"
            )),
        }
    }
}

/// Generated text exactly as the provider returned it, envelope removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCompletion(String);

impl RawCompletion {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Drops a leading copy of `prompt`. Text-generation models often return
    /// their input followed by the continuation, and the prompt's own
    /// format line would otherwise be mined as a suggestion.
    pub fn without_prompt_echo(self, prompt: &str) -> Self {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return self;
        }
        match self.0.trim_start().strip_prefix(prompt) {
            Some(rest) => Self(rest.to_string()),
            None => self,
        }
    }
}

impl From<String> for RawCompletion {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for RawCompletion {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

/// Anything that can turn a prompt into generated text.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<RawCompletion, InferenceError>;
}

#[derive(Debug, Serialize)]
struct HuggingFaceRequest<'a> {
    inputs: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// reqwest-backed client for either provider. Makes exactly one call per
/// `generate`; retrying is left to `RetryingClient`.
#[derive(Clone)]
pub struct HttpInferenceClient {
    client: Client,
    provider: Provider,
    url: String,
    model: String,
    api_key: String,
}

impl HttpInferenceClient {
    pub fn new(
        provider: Provider,
        url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, InferenceError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            provider,
            url: url.into(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }
}

#[async_trait]
impl InferenceClient for HttpInferenceClient {
    async fn generate(&self, prompt: &str) -> Result<RawCompletion, InferenceError> {
        let request = self.client.post(&self.url).bearer_auth(&self.api_key);
        let request = match self.provider {
            Provider::HuggingFace => request.json(&HuggingFaceRequest { inputs: prompt }),
            Provider::OpenAi => request.json(&ChatRequest {
                model: &self.model,
                messages: vec![ChatMessage {
                    role: "user",
                    content: prompt,
                }],
            }),
        };

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let error = envelope::classify_failure(status.as_u16(), &body);
            warn!("{} returned {}: {}", self.provider, status, error);
            return Err(error);
        }

        let completion = envelope::normalize(&body)?;
        debug!("{} completion: {:?}", self.provider, completion.as_str());
        Ok(completion)
    }
}
