//! Arithmetic tools.
//!
//! All pure and total except `divide` (zero divisor) and
//! `calculate_average` (empty or non-numeric input list).

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::tools::{require_f64, require_str, Tool, ToolError, ToolOutput, ToolRegistry};

fn two_number_schema(a_desc: &str, b_desc: &str) -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "a": {"type": "number", "description": a_desc},
            "b": {"type": "number", "description": b_desc}
        },
        "required": ["a", "b"]
    })
}

fn finite(value: f64) -> Result<ToolOutput, ToolError> {
    if value.is_finite() {
        Ok(ToolOutput::json(serde_json::json!(value)))
    } else {
        Err(ToolError::Failed("result is not a finite number".into()))
    }
}

pub struct AddTool;

#[async_trait]
impl Tool for AddTool {
    fn name(&self) -> &str {
        "add"
    }
    fn description(&self) -> &str {
        "Add two numbers together"
    }
    fn parameters_schema(&self) -> Value {
        two_number_schema("First number", "Second number")
    }
    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        let a = require_f64(&params, "a")?;
        let b = require_f64(&params, "b")?;
        let result = a + b;
        tracing::info!("{} + {} = {}", a, b, result);
        finite(result)
    }
}

pub struct SubtractTool;

#[async_trait]
impl Tool for SubtractTool {
    fn name(&self) -> &str {
        "subtract"
    }
    fn description(&self) -> &str {
        "Subtract second number from first number"
    }
    fn parameters_schema(&self) -> Value {
        two_number_schema("Number to subtract from", "Number to subtract")
    }
    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        let a = require_f64(&params, "a")?;
        let b = require_f64(&params, "b")?;
        let result = a - b;
        tracing::info!("{} - {} = {}", a, b, result);
        finite(result)
    }
}

pub struct MultiplyTool;

#[async_trait]
impl Tool for MultiplyTool {
    fn name(&self) -> &str {
        "multiply"
    }
    fn description(&self) -> &str {
        "Multiply two numbers together"
    }
    fn parameters_schema(&self) -> Value {
        two_number_schema("First factor", "Second factor")
    }
    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        let a = require_f64(&params, "a")?;
        let b = require_f64(&params, "b")?;
        let result = a * b;
        tracing::info!("{} * {} = {}", a, b, result);
        finite(result)
    }
}

pub struct DivideTool;

#[async_trait]
impl Tool for DivideTool {
    fn name(&self) -> &str {
        "divide"
    }
    fn description(&self) -> &str {
        "Divide first number by second number"
    }
    fn parameters_schema(&self) -> Value {
        two_number_schema("Dividend", "Divisor")
    }
    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        let a = require_f64(&params, "a")?;
        let b = require_f64(&params, "b")?;
        if b == 0.0 {
            return Err(ToolError::Failed("Cannot divide by zero".into()));
        }
        let result = a / b;
        tracing::info!("{} / {} = {}", a, b, result);
        finite(result)
    }
}

pub struct PowerTool;

#[async_trait]
impl Tool for PowerTool {
    fn name(&self) -> &str {
        "power"
    }
    fn description(&self) -> &str {
        "Raise base to the power of exponent"
    }
    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "base": {"type": "number", "description": "The base"},
                "exponent": {"type": "number", "description": "The exponent"}
            },
            "required": ["base", "exponent"]
        })
    }
    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        let base = require_f64(&params, "base")?;
        let exponent = require_f64(&params, "exponent")?;
        let result = base.powf(exponent);
        tracing::info!("{} ^ {} = {}", base, exponent, result);
        finite(result)
    }
}

pub struct CalculateAverageTool;

#[async_trait]
impl Tool for CalculateAverageTool {
    fn name(&self) -> &str {
        "calculate_average"
    }
    fn description(&self) -> &str {
        "Calculate average of comma-separated numbers, e.g. '1,2,3,4'"
    }
    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "numbers": {
                    "type": "string",
                    "description": "Comma-separated numbers like '1,2,3,4'"
                }
            },
            "required": ["numbers"]
        })
    }
    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        let raw = require_str(&params, "numbers")?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ToolError::Failed("No numbers provided".into()));
        }

        let mut values = Vec::new();
        for part in trimmed.split(',') {
            let parsed: f64 = part.trim().parse().map_err(|_| {
                ToolError::Failed(
                    "Invalid number format. Use comma-separated numbers like '1,2,3,4'".into(),
                )
            })?;
            values.push(parsed);
        }

        let average = values.iter().sum::<f64>() / values.len() as f64;
        tracing::info!("average of {:?} = {}", values, average);
        finite(average)
    }
}

/// Combined calculator used by the in-process agent: one tool covering the
/// four basic operations, selected by name.
pub struct CalculateTool;

#[async_trait]
impl Tool for CalculateTool {
    fn name(&self) -> &str {
        "calculate"
    }
    fn description(&self) -> &str {
        "Perform mathematical calculations. Operations: add, subtract, multiply, divide"
    }
    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "a": {"type": "number", "description": "First operand"},
                "b": {"type": "number", "description": "Second operand"},
                "operation": {
                    "type": "string",
                    "description": "One of: add, subtract, multiply, divide"
                }
            },
            "required": ["a", "b", "operation"]
        })
    }
    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        let a = require_f64(&params, "a")?;
        let b = require_f64(&params, "b")?;
        let operation = require_str(&params, "operation")?.to_ascii_lowercase();

        let (symbol, result) = match operation.as_str() {
            "add" => ("+", a + b),
            "subtract" => ("-", a - b),
            "multiply" => ("*", a * b),
            "divide" => {
                if b == 0.0 {
                    return Err(ToolError::Failed("Cannot divide by zero".into()));
                }
                ("/", a / b)
            }
            other => {
                return Err(ToolError::Failed(format!(
                    "Unknown operation: {}. Use: add, subtract, multiply, divide",
                    other
                )));
            }
        };

        Ok(ToolOutput::text(format!("{} {} {} = {}", a, symbol, b, result)))
    }
}

/// Register the tools served by the math server.
pub fn register_server_tools(registry: &mut ToolRegistry) {
    registry.register(Arc::new(AddTool));
    registry.register(Arc::new(SubtractTool));
    registry.register(Arc::new(MultiplyTool));
    registry.register(Arc::new(DivideTool));
    registry.register(Arc::new(PowerTool));
    registry.register(Arc::new(CalculateAverageTool));
}
