//! Weather tools backed by the National Weather Service API.
//!
//! Each invocation performs its HTTP calls once, with a bounded timeout.
//! Network failures and non-2xx responses become failed outcomes with a
//! human-readable message; there is no retry.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::tools::{optional_str, require_f64, require_str, Tool, ToolError, ToolOutput, ToolRegistry};

pub const NWS_API_BASE: &str = "https://api.weather.gov";
const USER_AGENT: &str = "weather-app/1.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Supported US cities and their coordinates.
const US_CITIES: &[(&str, f64, f64)] = &[
    ("san francisco", 37.7749, -122.4194),
    ("new york", 40.7128, -74.0060),
    ("los angeles", 34.0522, -118.2437),
    ("chicago", 41.8781, -87.6298),
    ("houston", 29.7604, -95.3698),
    ("phoenix", 33.4484, -112.0740),
    ("philadelphia", 39.9526, -75.1652),
    ("san antonio", 29.4241, -98.4936),
    ("san diego", 32.7157, -117.1611),
    ("dallas", 32.7767, -96.7970),
    ("miami", 25.7617, -80.1918),
    ("atlanta", 33.7490, -84.3880),
    ("boston", 42.3601, -71.0589),
    ("seattle", 47.6062, -122.3321),
    ("denver", 39.7392, -104.9903),
];

/// Resolve a city name against the static table, case-insensitively.
pub fn lookup_city(name: &str) -> Option<(f64, f64)> {
    let lower = name.trim().to_ascii_lowercase();
    US_CITIES
        .iter()
        .find(|(city, _, _)| *city == lower)
        .map(|(_, lat, lon)| (*lat, *lon))
}

/// Comma-separated list of supported city names, sorted.
pub fn supported_cities() -> String {
    let mut names: Vec<&str> = US_CITIES.iter().map(|(city, _, _)| *city).collect();
    names.sort();
    names.join(", ")
}

/// Title-case a city name for display ("san francisco" -> "San Francisco").
pub fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Thin client for the NWS forecast API.
pub struct NwsClient {
    http: reqwest::Client,
    base_url: String,
}

impl NwsClient {
    pub fn new() -> Self {
        Self::with_base_url(NWS_API_BASE)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Single-attempt GET returning parsed JSON.
    async fn get_json(&self, url: &str) -> Result<Value, ToolError> {
        let response = self
            .http
            .get(url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/geo+json")
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| ToolError::Failed(format!("Error fetching weather data: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::Failed(format!(
                "Error fetching weather data: HTTP {}",
                status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ToolError::Failed(format!("Error parsing weather data: {}", e)))
    }

    fn points_url(&self, latitude: f64, longitude: f64) -> String {
        format!("{}/points/{},{}", self.base_url, latitude, longitude)
    }

    /// Two-step forecast lookup: points -> forecast URL -> formatted periods.
    pub async fn forecast(
        &self,
        latitude: f64,
        longitude: f64,
        location_name: &str,
    ) -> Result<String, ToolError> {
        let points = self.get_json(&self.points_url(latitude, longitude)).await?;
        let forecast_url = json_str(&points, &["properties", "forecast"])?;
        let forecast = self.get_json(forecast_url).await?;
        format_forecast(&points, &forecast, location_name)
    }

    /// Latest observation from the nearest station.
    pub async fn current_conditions(
        &self,
        latitude: f64,
        longitude: f64,
        location_name: &str,
    ) -> Result<String, ToolError> {
        let points = self.get_json(&self.points_url(latitude, longitude)).await?;
        let stations_url = json_str(&points, &["properties", "observationStations"])?;
        let stations = self.get_json(stations_url).await?;

        let first_station = stations
            .get("features")
            .and_then(|f| f.as_array())
            .and_then(|f| f.first())
            .ok_or_else(|| {
                ToolError::Failed(format!(
                    "No observation stations found for {}",
                    location_name
                ))
            })?;

        let station_url = json_str(first_station, &["id"])?;
        let observation = self
            .get_json(&format!("{}/observations/latest", station_url))
            .await?;

        Ok(format_conditions(first_station, &observation, location_name))
    }

    /// Active alerts for a point.
    pub async fn alerts(
        &self,
        latitude: f64,
        longitude: f64,
        location_name: &str,
    ) -> Result<String, ToolError> {
        let url = format!(
            "{}/alerts/active?point={},{}",
            self.base_url, latitude, longitude
        );
        let alerts = self.get_json(&url).await?;
        Ok(format_alerts(&alerts, location_name))
    }
}

impl Default for NwsClient {
    fn default() -> Self {
        Self::new()
    }
}

fn json_str<'a>(value: &'a Value, path: &[&str]) -> Result<&'a str, ToolError> {
    let mut current = value;
    for key in path {
        current = current.get(key).ok_or_else(|| {
            ToolError::Failed(format!("Error parsing weather data: missing '{}'", key))
        })?;
    }
    current.as_str().ok_or_else(|| {
        ToolError::Failed(format!(
            "Error parsing weather data: '{}' is not a string",
            path.join(".")
        ))
    })
}

/// Render up to 5 forecast periods with grid metadata.
fn format_forecast(points: &Value, forecast: &Value, location_name: &str) -> Result<String, ToolError> {
    let props = &points["properties"];
    let office = props["gridId"].as_str().unwrap_or("?");
    let grid_x = &props["gridX"];
    let grid_y = &props["gridY"];

    let periods = forecast["properties"]["periods"].as_array().ok_or_else(|| {
        ToolError::Failed("Error parsing weather data: missing 'periods'".into())
    })?;

    let mut result = format!("Weather Forecast for {}\n", location_name);
    result.push_str(&format!(
        "Weather Office: {}, Grid: ({}, {})\n\n",
        office, grid_x, grid_y
    ));

    for period in periods.iter().take(5) {
        let name = period["name"].as_str().unwrap_or("?");
        let temperature = &period["temperature"];
        let unit = period["temperatureUnit"].as_str().unwrap_or("F");
        let short = period["shortForecast"].as_str().unwrap_or("");
        let detailed = period["detailedForecast"].as_str().unwrap_or("");

        result.push_str(&format!("{}: {}°{}\n", name, temperature, unit));
        result.push_str(&format!("  Conditions: {}\n", short));
        result.push_str(&format!("  Details: {}\n\n", truncate_chars(detailed, 150)));
    }

    Ok(result)
}

/// Render the latest station observation.
fn format_conditions(station: &Value, observation: &Value, location_name: &str) -> String {
    let props = &observation["properties"];
    let station_name = station["properties"]["name"].as_str().unwrap_or("?");

    let mut result = format!("Current Conditions for {}\n", location_name);
    result.push_str(&format!("Station: {}\n", station_name));
    result.push_str(&format!(
        "Time: {}\n",
        props["timestamp"].as_str().unwrap_or("N/A")
    ));

    if let Some(temp_c) = props["temperature"]["value"].as_f64() {
        let temp_f = temp_c * 9.0 / 5.0 + 32.0;
        result.push_str(&format!(
            "Temperature: {:.1}°F ({:.1}°C)\n",
            temp_f, temp_c
        ));
    }

    if let Some(description) = props["textDescription"].as_str() {
        if !description.is_empty() {
            result.push_str(&format!("Conditions: {}\n", description));
        }
    }

    if let Some(wind_ms) = props["windSpeed"]["value"].as_f64() {
        result.push_str(&format!("Wind Speed: {:.1} mph\n", wind_ms * 2.237));
    }

    if let Some(direction) = props["windDirection"]["value"].as_f64() {
        result.push_str(&format!("Wind Direction: {}°\n", direction));
    }

    if let Some(humidity) = props["relativeHumidity"]["value"].as_f64() {
        result.push_str(&format!("Humidity: {:.1}%\n", humidity));
    }

    result
}

/// Render up to 5 active alerts, or a quiet-weather message.
fn format_alerts(alerts: &Value, location_name: &str) -> String {
    let features = alerts
        .get("features")
        .and_then(|f| f.as_array())
        .cloned()
        .unwrap_or_default();

    if features.is_empty() {
        return format!("No active weather alerts for {}", location_name);
    }

    let mut result = format!("Active Weather Alerts for {}\n", location_name);
    result.push_str(&"=".repeat(50));
    result.push_str("\n\n");

    for alert in features.iter().take(5) {
        let props = &alert["properties"];
        result.push_str(&format!(
            "Alert: {}\n",
            props["event"].as_str().unwrap_or("Unknown")
        ));
        result.push_str(&format!(
            "Severity: {}\n",
            props["severity"].as_str().unwrap_or("Unknown")
        ));
        result.push_str(&format!(
            "Urgency: {}\n",
            props["urgency"].as_str().unwrap_or("Unknown")
        ));

        let areas = props["areaDesc"].as_str().unwrap_or("");
        let area_list: Vec<&str> = areas.split(';').take(3).map(|a| a.trim()).collect();
        result.push_str(&format!("Areas: {}\n", area_list.join(", ")));

        if let Some(headline) = props["headline"].as_str() {
            result.push_str(&format!("Headline: {}\n", headline));
        }
        if let Some(description) = props["description"].as_str() {
            result.push_str(&format!(
                "Description: {}\n",
                truncate_chars(description, 200)
            ));
        }

        result.push('\n');
        result.push_str(&"-".repeat(30));
        result.push_str("\n\n");
    }

    result
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max).collect::<String>())
    }
}

// ── Tools ───────────────────────────────────────────────────────────

fn coordinate_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "latitude": {"type": "number", "description": "Latitude in decimal degrees"},
            "longitude": {"type": "number", "description": "Longitude in decimal degrees"},
            "location_name": {
                "type": "string",
                "description": "Display name for the location (optional)"
            }
        },
        "required": ["latitude", "longitude"]
    })
}

pub struct GetWeatherForecastTool {
    client: Arc<NwsClient>,
}

impl GetWeatherForecastTool {
    pub fn new(client: Arc<NwsClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetWeatherForecastTool {
    fn name(&self) -> &str {
        "get_weather_forecast"
    }
    fn description(&self) -> &str {
        "Get weather forecast for a given location using latitude and longitude"
    }
    fn parameters_schema(&self) -> Value {
        coordinate_schema()
    }
    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        let latitude = require_f64(&params, "latitude")?;
        let longitude = require_f64(&params, "longitude")?;
        let name = optional_str(&params, "location_name").unwrap_or("Location");
        let report = self.client.forecast(latitude, longitude, name).await?;
        Ok(ToolOutput::text(report))
    }
}

pub struct GetCurrentConditionsTool {
    client: Arc<NwsClient>,
}

impl GetCurrentConditionsTool {
    pub fn new(client: Arc<NwsClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetCurrentConditionsTool {
    fn name(&self) -> &str {
        "get_current_conditions"
    }
    fn description(&self) -> &str {
        "Get current weather conditions for a given location"
    }
    fn parameters_schema(&self) -> Value {
        coordinate_schema()
    }
    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        let latitude = require_f64(&params, "latitude")?;
        let longitude = require_f64(&params, "longitude")?;
        let name = optional_str(&params, "location_name").unwrap_or("Location");
        let report = self
            .client
            .current_conditions(latitude, longitude, name)
            .await?;
        Ok(ToolOutput::text(report))
    }
}

pub struct GetWeatherAlertsTool {
    client: Arc<NwsClient>,
}

impl GetWeatherAlertsTool {
    pub fn new(client: Arc<NwsClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetWeatherAlertsTool {
    fn name(&self) -> &str {
        "get_weather_alerts"
    }
    fn description(&self) -> &str {
        "Get active weather alerts for a given location"
    }
    fn parameters_schema(&self) -> Value {
        coordinate_schema()
    }
    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        let latitude = require_f64(&params, "latitude")?;
        let longitude = require_f64(&params, "longitude")?;
        let name = optional_str(&params, "location_name").unwrap_or("Location");
        let report = self.client.alerts(latitude, longitude, name).await?;
        Ok(ToolOutput::text(report))
    }
}

pub struct GetCityWeatherTool {
    client: Arc<NwsClient>,
}

impl GetCityWeatherTool {
    pub fn new(client: Arc<NwsClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetCityWeatherTool {
    fn name(&self) -> &str {
        "get_city_weather"
    }
    fn description(&self) -> &str {
        "Get weather for common US cities by name"
    }
    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "city_name": {"type": "string", "description": "US city name, e.g. 'Denver'"}
            },
            "required": ["city_name"]
        })
    }
    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        let city_name = require_str(&params, "city_name")?;
        let (latitude, longitude) = lookup_city(city_name).ok_or_else(|| {
            ToolError::Failed(format!(
                "City '{}' not found. Available cities: {}",
                city_name,
                supported_cities()
            ))
        })?;
        let report = self
            .client
            .forecast(latitude, longitude, &title_case(city_name))
            .await?;
        Ok(ToolOutput::text(report))
    }
}

/// Register the tools served by the weather server.
pub fn register_server_tools(registry: &mut ToolRegistry, client: Arc<NwsClient>) {
    registry.register(Arc::new(GetWeatherForecastTool::new(Arc::clone(&client))));
    registry.register(Arc::new(GetCurrentConditionsTool::new(Arc::clone(&client))));
    registry.register(Arc::new(GetWeatherAlertsTool::new(Arc::clone(&client))));
    registry.register(Arc::new(GetCityWeatherTool::new(client)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_lookup_is_case_insensitive() {
        assert!(lookup_city("Denver").is_some());
        assert!(lookup_city("SAN FRANCISCO").is_some());
        assert!(lookup_city("  seattle ").is_some());
        assert!(lookup_city("Atlantis").is_none());
    }

    #[test]
    fn supported_cities_enumerates_all_fifteen() {
        let listing = supported_cities();
        assert_eq!(listing.split(", ").count(), 15);
        assert!(listing.contains("denver"));
        assert!(listing.contains("miami"));
    }

    #[test]
    fn title_case_handles_multiword_names() {
        assert_eq!(title_case("san francisco"), "San Francisco");
        assert_eq!(title_case("denver"), "Denver");
    }

    #[tokio::test]
    async fn unknown_city_fails_without_network() {
        let tool = GetCityWeatherTool::new(Arc::new(NwsClient::with_base_url(
            "http://127.0.0.1:9",
        )));
        let result = tool
            .execute(serde_json::json!({"city_name": "Atlantis"}))
            .await;
        match result {
            Err(ToolError::Failed(msg)) => {
                assert!(msg.contains("'Atlantis' not found"));
                assert!(msg.contains("denver"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn forecast_formatting() {
        let points = serde_json::json!({
            "properties": {"gridId": "BOU", "gridX": 62, "gridY": 61, "forecast": "u"}
        });
        let forecast = serde_json::json!({
            "properties": {"periods": [
                {
                    "name": "Tonight",
                    "temperature": 55,
                    "temperatureUnit": "F",
                    "shortForecast": "Partly Cloudy",
                    "detailedForecast": "Partly cloudy, with a low around 55."
                },
                {
                    "name": "Friday",
                    "temperature": 82,
                    "temperatureUnit": "F",
                    "shortForecast": "Sunny",
                    "detailedForecast": "Sunny, with a high near 82."
                }
            ]}
        });

        let report = format_forecast(&points, &forecast, "Denver").unwrap();
        assert!(report.starts_with("Weather Forecast for Denver"));
        assert!(report.contains("Weather Office: BOU, Grid: (62, 61)"));
        assert!(report.contains("Tonight: 55°F"));
        assert!(report.contains("Conditions: Sunny"));
    }

    #[test]
    fn conditions_formatting_converts_units() {
        let station = serde_json::json!({"id": "s", "properties": {"name": "Denver Intl"}});
        let observation = serde_json::json!({
            "properties": {
                "timestamp": "2024-06-01T12:00:00Z",
                "temperature": {"value": 20.0},
                "textDescription": "Clear",
                "windSpeed": {"value": 10.0},
                "windDirection": {"value": 180.0},
                "relativeHumidity": {"value": 40.0}
            }
        });

        let report = format_conditions(&station, &observation, "Denver");
        assert!(report.contains("Station: Denver Intl"));
        assert!(report.contains("Temperature: 68.0°F (20.0°C)"));
        assert!(report.contains("Wind Speed: 22.4 mph"));
        assert!(report.contains("Humidity: 40.0%"));
    }

    #[test]
    fn alerts_formatting_quiet_weather() {
        let alerts = serde_json::json!({"features": []});
        assert_eq!(
            format_alerts(&alerts, "Denver"),
            "No active weather alerts for Denver"
        );
    }

    #[test]
    fn alerts_formatting_with_one_alert() {
        let alerts = serde_json::json!({"features": [{
            "properties": {
                "event": "Winter Storm Warning",
                "severity": "Severe",
                "urgency": "Expected",
                "areaDesc": "Denver; Boulder; Fort Collins; Greeley",
                "headline": "Heavy snow expected",
                "description": "Total snow accumulations of 8 to 14 inches."
            }
        }]});

        let report = format_alerts(&alerts, "Denver");
        assert!(report.contains("Alert: Winter Storm Warning"));
        assert!(report.contains("Severity: Severe"));
        // Only the first three areas are listed.
        assert!(report.contains("Areas: Denver, Boulder, Fort Collins"));
        assert!(!report.contains("Greeley"));
    }
}
