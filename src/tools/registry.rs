//! Tool registry — explicit, built once at startup.
//!
//! The registry is constructed and populated before any invocation happens,
//! then shared read-only. There is no ambient global registration.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::llm::ToolDefinition;
use crate::tools::{Tool, ToolOutcome};

/// Default bounded wait per tool invocation.
const DEFAULT_INVOKE_TIMEOUT: Duration = Duration::from_secs(30);

/// Registry of available tools.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    invoke_timeout: Duration,
}

impl ToolRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            invoke_timeout: DEFAULT_INVOKE_TIMEOUT,
        }
    }

    /// Set the per-invocation timeout.
    pub fn with_invoke_timeout(mut self, timeout: Duration) -> Self {
        self.invoke_timeout = timeout;
        self
    }

    /// Register a tool. Duplicate names overwrite, last registration wins.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            tracing::warn!(tool = %name, "Replacing previously registered tool");
        } else {
            tracing::debug!(tool = %name, "Registered tool");
        }
    }

    /// Check if a tool exists.
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// List all tool names, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered tools.
    pub fn count(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Descriptors for advertisement to the reasoning model.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self
            .tools
            .values()
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters_schema(),
            })
            .collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Invoke a tool by name.
    ///
    /// Every failure mode (unknown tool, bad arguments, handler error,
    /// timeout) becomes a failed [`ToolOutcome`]; nothing propagates.
    pub async fn invoke(&self, name: &str, arguments: &Value) -> ToolOutcome {
        let tool = match self.tools.get(name) {
            Some(tool) => tool,
            None => {
                return ToolOutcome::failure(format!(
                    "Tool '{}' not found. Available tools: {}",
                    name,
                    self.list().join(", ")
                ));
            }
        };

        if let Err(reason) = validate_shallow(&tool.parameters_schema(), arguments) {
            return ToolOutcome::failure(format!("Invalid arguments for '{}': {}", name, reason));
        }

        match tokio::time::timeout(self.invoke_timeout, tool.execute(arguments.clone())).await {
            Ok(result) => ToolOutcome::from(result),
            Err(_) => ToolOutcome::failure(format!(
                "Tool '{}' timed out after {:?}",
                name, self.invoke_timeout
            )),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Shallow argument validation: required keys present, declared types
/// coercible. Nested schemas are not descended into.
fn validate_shallow(schema: &Value, arguments: &Value) -> Result<(), String> {
    let args = match arguments {
        Value::Object(map) => map,
        Value::Null => {
            return match schema.get("required").and_then(|r| r.as_array()) {
                Some(required) if !required.is_empty() => {
                    Err("expected an object with arguments, got null".into())
                }
                _ => Ok(()),
            };
        }
        other => return Err(format!("expected an object, got {}", type_name(other))),
    };

    if let Some(required) = schema.get("required").and_then(|r| r.as_array()) {
        for key in required.iter().filter_map(|k| k.as_str()) {
            if !args.contains_key(key) {
                return Err(format!("missing required parameter '{}'", key));
            }
        }
    }

    if let Some(props) = schema.get("properties").and_then(|p| p.as_object()) {
        for (key, prop) in props {
            let value = match args.get(key) {
                Some(v) => v,
                None => continue,
            };
            let declared = match prop.get("type").and_then(|t| t.as_str()) {
                Some(t) => t,
                None => continue,
            };
            if !coercible(declared, value) {
                return Err(format!(
                    "parameter '{}' expected {}, got {}",
                    key,
                    declared,
                    type_name(value)
                ));
            }
        }
    }

    Ok(())
}

fn coercible(declared: &str, value: &Value) -> bool {
    match declared {
        "number" => {
            value.is_number()
                || value
                    .as_str()
                    .map(|s| s.trim().parse::<f64>().is_ok())
                    .unwrap_or(false)
        }
        "integer" => {
            value.is_i64()
                || value.is_u64()
                || value
                    .as_str()
                    .map(|s| s.trim().parse::<i64>().is_ok())
                    .unwrap_or(false)
        }
        "string" => value.is_string(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        _ => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ToolError, ToolOutput};
    use async_trait::async_trait;

    struct EchoTool {
        name: String,
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            &self.name
        }
        fn description(&self) -> &str {
            "Echo the input text"
        }
        fn parameters_schema(&self) -> Value {
            serde_json::json!({
                "type": "object",
                "properties": {"text": {"type": "string"}},
                "required": ["text"]
            })
        }
        async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
            let text = crate::tools::require_str(&params, "text")?;
            Ok(ToolOutput::text(text))
        }
    }

    struct PanickyTool;

    #[async_trait]
    impl Tool for PanickyTool {
        fn name(&self) -> &str {
            "broken"
        }
        fn description(&self) -> &str {
            "Always fails"
        }
        fn parameters_schema(&self) -> Value {
            serde_json::json!({"type": "object", "properties": {}})
        }
        async fn execute(&self, _params: Value) -> Result<ToolOutput, ToolError> {
            Err(ToolError::Failed("internal failure".into()))
        }
    }

    fn registry_with_echo() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool {
            name: "echo".into(),
        }));
        registry
    }

    #[tokio::test]
    async fn invoke_success() {
        let registry = registry_with_echo();
        let outcome = registry
            .invoke("echo", &serde_json::json!({"text": "hi"}))
            .await;
        assert_eq!(outcome, ToolOutcome::success(serde_json::json!("hi")));
    }

    #[tokio::test]
    async fn unknown_tool_is_a_failure_not_an_error() {
        let registry = registry_with_echo();
        let outcome = registry.invoke("nope", &serde_json::json!({})).await;
        match outcome {
            ToolOutcome::Failure { error } => {
                assert!(error.contains("not found"));
                assert!(error.contains("echo"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_required_argument_fails_before_handler() {
        let registry = registry_with_echo();
        let outcome = registry.invoke("echo", &serde_json::json!({})).await;
        match outcome {
            ToolOutcome::Failure { error } => assert!(error.contains("text")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn wrong_argument_type_fails() {
        let registry = registry_with_echo();
        let outcome = registry.invoke("echo", &serde_json::json!({"text": 7})).await;
        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn handler_error_becomes_failed_outcome() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(PanickyTool));
        let outcome = registry.invoke("broken", &serde_json::json!({})).await;
        match outcome {
            ToolOutcome::Failure { error } => assert!(error.contains("internal failure")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_registration_last_wins() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool {
            name: "echo".into(),
        }));
        registry.register(Arc::new(EchoTool {
            name: "echo".into(),
        }));
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn definitions_are_sorted() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool { name: "b".into() }));
        registry.register(Arc::new(EchoTool { name: "a".into() }));
        let defs = registry.definitions();
        assert_eq!(defs[0].name, "a");
        assert_eq!(defs[1].name, "b");
    }

    #[test]
    fn shallow_validation_coerces_numeric_strings() {
        let schema = serde_json::json!({
            "type": "object",
            "properties": {"a": {"type": "number"}},
            "required": ["a"]
        });
        assert!(validate_shallow(&schema, &serde_json::json!({"a": 2})).is_ok());
        assert!(validate_shallow(&schema, &serde_json::json!({"a": "2.5"})).is_ok());
        assert!(validate_shallow(&schema, &serde_json::json!({"a": true})).is_err());
        assert!(validate_shallow(&schema, &serde_json::json!({})).is_err());
    }
}
