//! Current-weather tool backed by the OpenWeatherMap API.
//!
//! The model calls this with a location and optional units; the result is
//! fed back as a tool message so the second completion can phrase it.

use async_trait::async_trait;
use colloquy_core::error::ToolError;
use colloquy_core::tool::{Tool, ToolResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

const OPENWEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

pub struct CurrentWeatherTool {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl CurrentWeatherTool {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: OPENWEATHER_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Point the tool at a different endpoint (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch(&self, location: &str, units: &str) -> Result<WeatherReport, ToolError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", location),
                ("appid", &self.api_key),
                ("units", units),
            ])
            .send()
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "current_weather".into(),
                reason: format!("request failed: {e}"),
            })?;

        let status = response.status().as_u16();
        if status == 401 {
            return Err(ToolError::ExecutionFailed {
                tool_name: "current_weather".into(),
                reason: "weather API key rejected".into(),
            });
        }
        if status != 200 {
            // OpenWeatherMap puts a human-readable message in the error body
            // (e.g. "city not found" on 404).
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            let message = body["message"]
                .as_str()
                .unwrap_or("unknown error")
                .to_string();
            return Err(ToolError::ExecutionFailed {
                tool_name: "current_weather".into(),
                reason: format!("weather lookup failed ({status}): {message}"),
            });
        }

        let api: ApiWeatherResponse =
            response.json().await.map_err(|e| ToolError::ExecutionFailed {
                tool_name: "current_weather".into(),
                reason: format!("unexpected response shape: {e}"),
            })?;

        Ok(WeatherReport::from_api(api, units))
    }
}

#[async_trait]
impl Tool for CurrentWeatherTool {
    fn name(&self) -> &str {
        "current_weather"
    }

    fn description(&self) -> &str {
        "Get the current weather for a city. Returns temperature, feels-like, daily min/max, humidity, and conditions."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "City name, e.g. 'Paris' or 'Paris,FR'"
                },
                "units": {
                    "type": "string",
                    "enum": ["metric", "imperial"],
                    "description": "Temperature units (default: metric)",
                    "default": "metric"
                }
            },
            "required": ["location"]
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<ToolResult, ToolError> {
        let location = arguments["location"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'location' argument".into()))?;
        let units = arguments["units"].as_str().unwrap_or("metric");
        if units != "metric" && units != "imperial" {
            return Err(ToolError::InvalidArguments(format!(
                "Unknown units '{units}'"
            )));
        }

        debug!(location, units, "Fetching current weather");
        let report = self.fetch(location, units).await?;
        let output = serde_json::to_string(&report).map_err(|e| ToolError::ExecutionFailed {
            tool_name: "current_weather".into(),
            reason: format!("serialize report: {e}"),
        })?;

        Ok(ToolResult {
            call_id: String::new(),
            success: true,
            output,
        })
    }
}

/// The shape handed back to the model.
#[derive(Debug, Serialize)]
pub struct WeatherReport {
    pub location: String,
    pub conditions: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: u32,
    pub units: String,
}

impl WeatherReport {
    fn from_api(api: ApiWeatherResponse, units: &str) -> Self {
        let conditions = api
            .weather
            .first()
            .map(|w| w.description.clone())
            .unwrap_or_default();
        Self {
            location: api.name,
            conditions,
            temperature: api.main.temp,
            feels_like: api.main.feels_like,
            temp_min: api.main.temp_min,
            temp_max: api.main.temp_max,
            humidity: api.main.humidity,
            units: units.to_string(),
        }
    }
}

// --- OpenWeatherMap wire types ---

#[derive(Debug, Deserialize)]
struct ApiWeatherResponse {
    name: String,
    main: ApiMain,
    #[serde(default)]
    weather: Vec<ApiCondition>,
}

#[derive(Debug, Deserialize)]
struct ApiMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    humidity: u32,
}

#[derive(Debug, Deserialize)]
struct ApiCondition {
    description: String,
}
