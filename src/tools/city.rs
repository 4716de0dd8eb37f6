//! Static city information tool.

use async_trait::async_trait;
use serde_json::Value;

use crate::tools::{require_str, Tool, ToolError, ToolOutput};

/// Basic facts about major US cities.
const CITY_INFO: &[(&str, &str)] = &[
    ("new york", "Population: ~8.3M, Known for: Times Square, Statue of Liberty"),
    ("los angeles", "Population: ~3.9M, Known for: Hollywood, Beaches"),
    ("chicago", "Population: ~2.7M, Known for: Deep dish pizza, Architecture"),
    ("houston", "Population: ~2.3M, Known for: Space Center, Oil industry"),
    ("phoenix", "Population: ~1.6M, Known for: Desert, Sunshine"),
    ("philadelphia", "Population: ~1.6M, Known for: Liberty Bell, Cheesesteaks"),
    ("san antonio", "Population: ~1.5M, Known for: The Alamo, River Walk"),
    ("san diego", "Population: ~1.4M, Known for: Zoo, Perfect weather"),
    ("dallas", "Population: ~1.3M, Known for: Cowboys, BBQ"),
    ("denver", "Population: ~715K, Known for: Mountains, Mile high city"),
];

pub struct GetCityInfoTool;

#[async_trait]
impl Tool for GetCityInfoTool {
    fn name(&self) -> &str {
        "get_city_info"
    }

    fn description(&self) -> &str {
        "Get basic information about major US cities"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "city_name": {"type": "string", "description": "US city name, e.g. 'Chicago'"}
            },
            "required": ["city_name"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        let city_name = require_str(&params, "city_name")?;
        let lower = city_name.trim().to_ascii_lowercase();

        match CITY_INFO.iter().find(|(city, _)| *city == lower) {
            Some((_, info)) => Ok(ToolOutput::text(format!(
                "{}: {}",
                crate::tools::weather::title_case(city_name),
                info
            ))),
            None => {
                let available = CITY_INFO
                    .iter()
                    .map(|(city, _)| crate::tools::weather::title_case(city))
                    .collect::<Vec<_>>()
                    .join(", ");
                Err(ToolError::Failed(format!(
                    "City '{}' not found. Available cities: {}",
                    city_name, available
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn known_city_returns_info() {
        let out = GetCityInfoTool
            .execute(serde_json::json!({"city_name": "chicago"}))
            .await
            .unwrap();
        let text = out.value.as_str().unwrap();
        assert!(text.starts_with("Chicago:"));
        assert!(text.contains("Deep dish pizza"));
    }

    #[tokio::test]
    async fn unknown_city_lists_available() {
        let result = GetCityInfoTool
            .execute(serde_json::json!({"city_name": "Atlantis"}))
            .await;
        match result {
            Err(ToolError::Failed(msg)) => {
                assert!(msg.contains("'Atlantis' not found"));
                assert!(msg.contains("Denver"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }
}
