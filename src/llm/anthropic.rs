//! Anthropic Messages API provider.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::llm::provider::{CompletionOptions, LlmProvider};
use crate::llm::types::{
    CompletionResponse, FinishReason, Message, Role, TokenUsage, ToolCall, ToolDefinition,
};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

/// Anthropic Messages API provider.
pub struct AnthropicProvider {
    client: Client,
    base_url: String,
    model: String,
    api_key: SecretString,
}

impl AnthropicProvider {
    pub fn new(client: Client, base_url: impl Into<String>, model: impl Into<String>, api_key: SecretString) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
            api_key,
        }
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, LlmError> {
        let url = format!("{}/v1/messages", self.base_url);
        let (system, wire_messages) = to_wire_messages(messages);

        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            system,
            messages: wire_messages,
            tools: if tools.is_empty() {
                None
            } else {
                Some(tools.iter().map(WireTool::from).collect())
            },
        };

        tracing::debug!(
            model = %self.model,
            messages = messages.len(),
            tools = tools.len(),
            "Sending messages request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .timeout(options.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout {
                        provider: "anthropic".into(),
                        timeout: options.timeout,
                    }
                } else {
                    LlmError::RequestFailed {
                        provider: "anthropic".into(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(LlmError::RateLimited {
                provider: "anthropic".into(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                provider: "anthropic".into(),
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: MessagesResponse =
            response.json().await.map_err(|e| LlmError::InvalidResponse {
                provider: "anthropic".into(),
                reason: e.to_string(),
            })?;

        let mut text_parts: Vec<String> = Vec::new();
        let mut tool_calls: Vec<ToolCall> = Vec::new();
        for block in parsed.content {
            match block {
                ContentBlock::Text { text } => text_parts.push(text),
                ContentBlock::ToolUse { id, name, input } => tool_calls.push(ToolCall {
                    id,
                    name,
                    arguments: input,
                }),
                ContentBlock::ToolResult { .. } => {
                    // Request-only block; a server echoing one is ignored.
                }
            }
        }

        let has_tool_calls = !tool_calls.is_empty();
        let message = Message {
            role: Role::Assistant,
            content: text_parts.join("\n"),
            tool_calls: if has_tool_calls { Some(tool_calls) } else { None },
            tool_call_id: None,
            tool_name: None,
        };

        let finish_reason = match parsed.stop_reason.as_deref() {
            Some("tool_use") => FinishReason::ToolCalls,
            Some("max_tokens") => FinishReason::MaxTokens,
            _ if has_tool_calls => FinishReason::ToolCalls,
            _ => FinishReason::Stop,
        };

        let usage = parsed.usage.map(|u| TokenUsage {
            prompt_tokens: u.input_tokens,
            completion_tokens: u.output_tokens,
        });

        Ok(CompletionResponse {
            message,
            finish_reason,
            usage,
        })
    }
}

/// Split out system messages and convert the rest to wire form.
///
/// Tool-result messages must land in the user message immediately following
/// the assistant's tool_use, so consecutive tool results merge into one
/// user message.
fn to_wire_messages(messages: &[Message]) -> (Option<String>, Vec<WireMessage>) {
    let mut system_parts: Vec<&str> = Vec::new();
    let mut out: Vec<WireMessage> = Vec::new();

    for msg in messages {
        match msg.role {
            Role::System => system_parts.push(&msg.content),
            Role::User => out.push(WireMessage {
                role: "user",
                content: vec![ContentBlock::Text {
                    text: msg.content.clone(),
                }],
            }),
            Role::Assistant => {
                let mut blocks = Vec::new();
                if !msg.content.is_empty() {
                    blocks.push(ContentBlock::Text {
                        text: msg.content.clone(),
                    });
                }
                if let Some(calls) = &msg.tool_calls {
                    for call in calls {
                        blocks.push(ContentBlock::ToolUse {
                            id: call.id.clone(),
                            name: call.name.clone(),
                            input: call.arguments.clone(),
                        });
                    }
                }
                out.push(WireMessage {
                    role: "assistant",
                    content: blocks,
                });
            }
            Role::Tool => {
                let block = ContentBlock::ToolResult {
                    tool_use_id: msg.tool_call_id.clone().unwrap_or_default(),
                    content: msg.content.clone(),
                };
                let merged = match out.last_mut() {
                    Some(last)
                        if last.role == "user"
                            && matches!(
                                last.content.last(),
                                Some(ContentBlock::ToolResult { .. })
                            ) =>
                    {
                        last.content.push(block.clone());
                        true
                    }
                    _ => false,
                };
                if !merged {
                    out.push(WireMessage {
                        role: "user",
                        content: vec![block],
                    });
                }
            }
        }
    }

    let system = if system_parts.is_empty() {
        None
    } else {
        Some(system_parts.join("\n\n"))
    };
    (system, out)
}

// Wire types for the Messages API.

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
}

#[derive(Debug, Serialize)]
struct WireTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

impl From<&ToolDefinition> for WireTool {
    fn from(def: &ToolDefinition) -> Self {
        WireTool {
            name: def.name.clone(),
            description: def.description.clone(),
            input_schema: def.parameters.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    input_tokens: u32,
    output_tokens: u32,
}
