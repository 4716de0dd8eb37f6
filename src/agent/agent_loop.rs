//! The reasoning/acting loop.
//!
//! One run handles one user utterance: the model either answers directly or
//! selects tools; tool results are appended to the conversation and the
//! model is asked again, until a final answer or the turn cap.

use std::sync::Arc;

use crate::agent::source::ToolSource;
use crate::llm::{CompletionOptions, LlmProvider, Message};

/// Default cap on reasoning/acting round trips per run.
const DEFAULT_MAX_TURNS: usize = 8;

/// Terminal outcome of one agent run.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopOutcome {
    /// The model produced a final answer.
    Answer(String),
    /// The turn cap was reached before a final answer.
    MaxTurnsExceeded,
    /// The reasoning backend failed; the run stops without retrying.
    LlmFailure(String),
}

impl LoopOutcome {
    /// Text shown to the user.
    pub fn user_text(&self) -> String {
        match self {
            Self::Answer(text) => text.clone(),
            Self::MaxTurnsExceeded => {
                "Stopped: maximum tool-calling turns exceeded without a final answer.".into()
            }
            Self::LlmFailure(_) => {
                "Sorry, the reasoning model is unavailable right now. Please try again.".into()
            }
        }
    }
}

/// Result of one run: terminal outcome plus the full conversation.
#[derive(Debug)]
pub struct RunReport {
    pub outcome: LoopOutcome,
    /// Append-only conversation, discarded by the caller after the run.
    pub messages: Vec<Message>,
    /// Model round trips performed.
    pub turns: usize,
    /// Tool invocations performed (successes and failures).
    pub tool_invocations: usize,
}

/// The agent loop: REASONING -> ACTING -> REASONING -> ... -> DONE.
pub struct AgentLoop {
    llm: Arc<dyn LlmProvider>,
    tools: Arc<dyn ToolSource>,
    options: CompletionOptions,
    system_prompt: Option<String>,
    max_turns: usize,
}

impl AgentLoop {
    pub fn new(llm: Arc<dyn LlmProvider>, tools: Arc<dyn ToolSource>) -> Self {
        Self {
            llm,
            tools,
            options: CompletionOptions::default(),
            system_prompt: None,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }

    /// Run one user utterance to completion.
    ///
    /// No state survives between runs; each call starts a fresh
    /// conversation.
    pub async fn run(&self, user_input: &str) -> RunReport {
        let mut messages = Vec::new();
        if let Some(prompt) = &self.system_prompt {
            messages.push(Message::system(prompt));
        }
        messages.push(Message::user(user_input));

        let definitions = self.tools.definitions();
        let mut turns = 0;
        let mut tool_invocations = 0;

        // REASONING state: each iteration is one model round trip. Tool
        // selections move through ACTING and back; anything else is DONE.
        while turns < self.max_turns {
            turns += 1;

            let response = match self
                .llm
                .complete(&messages, &definitions, &self.options)
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(error = %e, "Reasoning call failed");
                    return RunReport {
                        outcome: LoopOutcome::LlmFailure(e.to_string()),
                        messages,
                        turns,
                        tool_invocations,
                    };
                }
            };

            let tool_calls = response.message.tool_calls.clone().unwrap_or_default();
            messages.push(response.message.clone());

            if tool_calls.is_empty() {
                // DONE: final answer with no further tool selection.
                return RunReport {
                    outcome: LoopOutcome::Answer(response.message.content),
                    messages,
                    turns,
                    tool_invocations,
                };
            }

            // ACTING state: execute each selected tool sequentially and
            // fold the results (success or failure) into the conversation.
            for call in &tool_calls {
                tracing::info!(tool = %call.name, "Using tool");
                let outcome = self.tools.invoke(&call.name, &call.arguments).await;
                tool_invocations += 1;
                if !outcome.is_success() {
                    tracing::warn!(tool = %call.name, result = %outcome.render(), "Tool failed");
                }
                messages.push(Message::tool_result(
                    call.id.clone(),
                    call.name.clone(),
                    outcome.render(),
                ));
            }
        }

        tracing::warn!(max_turns = self.max_turns, "Turn cap reached");
        RunReport {
            outcome: LoopOutcome::MaxTurnsExceeded,
            messages,
            turns,
            tool_invocations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_user_text() {
        assert_eq!(LoopOutcome::Answer("42".into()).user_text(), "42");
        assert!(LoopOutcome::MaxTurnsExceeded
            .user_text()
            .contains("maximum tool-calling turns"));
        assert!(!LoopOutcome::LlmFailure("boom".into())
            .user_text()
            .contains("boom"));
    }
}
