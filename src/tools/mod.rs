//! Tool abstraction and built-in tools.

pub mod city;
pub mod math;
pub mod registry;
pub mod weather;

pub use registry::ToolRegistry;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

/// Errors raised inside a tool handler.
///
/// These never escape an invocation: the registry converts every variant
/// into a failed [`ToolOutcome`] that is folded back into the conversation.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("{0}")]
    Failed(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Value produced by a successful tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub value: Value,
}

impl ToolOutput {
    pub fn text(s: impl Into<String>) -> Self {
        Self {
            value: Value::String(s.into()),
        }
    }

    pub fn json(value: Value) -> Self {
        Self { value }
    }
}

/// Explicit two-branch result of a tool invocation.
///
/// Wire form: `{"ok": true, "result": ...}` or `{"ok": false, "error": ...}`.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Success { value: Value },
    Failure { error: String },
}

impl ToolOutcome {
    pub fn success(value: Value) -> Self {
        Self::Success { value }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Text representation folded into the conversation.
    pub fn render(&self) -> String {
        match self {
            Self::Success { value } => match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
            Self::Failure { error } => format!("Error: {}", error),
        }
    }

    /// Wire representation: `{ok, result | error}`.
    pub fn to_wire(&self) -> Value {
        match self {
            Self::Success { value } => serde_json::json!({"ok": true, "result": value}),
            Self::Failure { error } => serde_json::json!({"ok": false, "error": error}),
        }
    }
}

impl From<Result<ToolOutput, ToolError>> for ToolOutcome {
    fn from(result: Result<ToolOutput, ToolError>) -> Self {
        match result {
            Ok(output) => Self::Success {
                value: output.value,
            },
            Err(e) => Self::Failure {
                error: e.to_string(),
            },
        }
    }
}

/// A named, schema-described callable exposed to the reasoning model.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name.
    fn name(&self) -> &str;

    /// Human-readable description advertised to the model.
    fn description(&self) -> &str;

    /// JSON schema describing the accepted parameters.
    fn parameters_schema(&self) -> Value;

    /// Execute with validated parameters.
    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError>;
}

/// Extract a required string parameter.
pub fn require_str<'a>(params: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::InvalidParameters(format!("missing string parameter '{}'", key)))
}

/// Extract a required numeric parameter, coercing numeric strings.
pub fn require_f64(params: &Value, key: &str) -> Result<f64, ToolError> {
    let value = params.get(key).ok_or_else(|| {
        ToolError::InvalidParameters(format!("missing numeric parameter '{}'", key))
    })?;
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| {
            ToolError::InvalidParameters(format!("parameter '{}' is not a finite number", key))
        }),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| {
            ToolError::InvalidParameters(format!("parameter '{}' is not numeric", key))
        }),
        _ => Err(ToolError::InvalidParameters(format!(
            "parameter '{}' is not numeric",
            key
        ))),
    }
}

/// Extract an optional string parameter.
pub fn optional_str<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(|v| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_render() {
        let ok = ToolOutcome::success(serde_json::json!("hello"));
        assert_eq!(ok.render(), "hello");

        let num = ToolOutcome::success(serde_json::json!(42.0));
        assert_eq!(num.render(), "42.0");

        let err = ToolOutcome::failure("Cannot divide by zero");
        assert_eq!(err.render(), "Error: Cannot divide by zero");
    }

    #[test]
    fn outcome_wire_form() {
        let ok = ToolOutcome::success(serde_json::json!(5.0));
        assert_eq!(ok.to_wire(), serde_json::json!({"ok": true, "result": 5.0}));

        let err = ToolOutcome::failure("boom");
        assert_eq!(
            err.to_wire(),
            serde_json::json!({"ok": false, "error": "boom"})
        );
    }

    #[test]
    fn require_f64_coerces_strings() {
        let params = serde_json::json!({"a": "2.5", "b": 3});
        assert_eq!(require_f64(&params, "a").unwrap(), 2.5);
        assert_eq!(require_f64(&params, "b").unwrap(), 3.0);
        assert!(require_f64(&params, "c").is_err());
        assert!(require_f64(&serde_json::json!({"a": "x"}), "a").is_err());
    }
}
