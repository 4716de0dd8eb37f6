//! LLM integration.
//!
//! Two backends, both speaking their native HTTP APIs via reqwest:
//! - **Anthropic**: Messages API
//! - **OpenAI**: chat completions (also covers OpenAI-compatible services)

pub mod anthropic;
pub mod openai;
pub mod provider;
pub mod types;

pub use provider::{CompletionOptions, LlmProvider};
pub use types::*;

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::{ConfigError, LlmError};

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    Anthropic,
    OpenAi,
}

impl LlmBackend {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "anthropic" => Some(Self::Anthropic),
            "openai" => Some(Self::OpenAi),
            _ => None,
        }
    }

    fn key_var(&self) -> &'static str {
        match self {
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            Self::Anthropic => "claude-3-5-sonnet-latest",
            Self::OpenAi => "gpt-4o",
        }
    }

    fn base_url_var(&self) -> &'static str {
        match self {
            Self::Anthropic => "ANTHROPIC_BASE_URL",
            Self::OpenAi => "OPENAI_BASE_URL",
        }
    }
}

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub api_key: SecretString,
    pub model: String,
    pub base_url: Option<String>,
}

impl LlmConfig {
    /// Read backend selection and credentials from the environment.
    ///
    /// Missing credentials are a startup-fatal configuration error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend_raw = std::env::var("LLM_BACKEND").unwrap_or_else(|_| "anthropic".into());
        let backend =
            LlmBackend::parse(&backend_raw).ok_or_else(|| ConfigError::InvalidValue {
                key: "LLM_BACKEND".into(),
                message: format!("unknown backend '{}', expected anthropic or openai", backend_raw),
            })?;

        let api_key = std::env::var(backend.key_var())
            .map(SecretString::from)
            .map_err(|_| ConfigError::MissingEnvVar(backend.key_var().into()))?;

        let model =
            std::env::var("AGENT_MODEL").unwrap_or_else(|_| backend.default_model().into());
        let base_url = std::env::var(backend.base_url_var()).ok();

        Ok(Self {
            backend,
            api_key,
            model,
            base_url,
        })
    }
}

/// Create an LLM provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| LlmError::RequestFailed {
            provider: "http".into(),
            reason: format!("failed to build HTTP client: {}", e),
        })?;

    let provider: Arc<dyn LlmProvider> = match config.backend {
        LlmBackend::Anthropic => Arc::new(anthropic::AnthropicProvider::new(
            client,
            config
                .base_url
                .clone()
                .unwrap_or_else(|| anthropic::DEFAULT_BASE_URL.into()),
            config.model.clone(),
            config.api_key.clone(),
        )),
        LlmBackend::OpenAi => Arc::new(openai::OpenAiProvider::new(
            client,
            config
                .base_url
                .clone()
                .unwrap_or_else(|| openai::DEFAULT_BASE_URL.into()),
            config.model.clone(),
            config.api_key.clone(),
        )),
    };

    tracing::info!(backend = ?config.backend, model = %config.model, "LLM provider ready");
    Ok(provider)
}
