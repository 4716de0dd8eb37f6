//! Provider abstraction over reasoning-model backends.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::LlmError;
use crate::llm::types::{CompletionResponse, Message, ToolDefinition};

/// Options applied to every completion request.
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Bounded wait for the whole round trip. One attempt per call, no retry.
    pub timeout: Duration,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            max_tokens: 2000,
            timeout: Duration::from_secs(120),
        }
    }
}

/// A reasoning-model backend that can answer directly or select tools.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logging and error messages.
    fn name(&self) -> &str;

    /// Model identifier in use.
    fn model(&self) -> &str;

    /// Run one completion. `tools` may be empty, in which case the model
    /// can only answer with text.
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, LlmError>;
}
