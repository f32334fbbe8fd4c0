//! Built-in tools for Colloquy.
//!
//! Tools are optional per session: a registry with no entries means the
//! model is never offered function calling.

pub mod weather;

pub use weather::CurrentWeatherTool;

use colloquy_core::tool::ToolRegistry;

/// Build a registry with the weather tool, when an API key is configured.
pub fn default_registry(weather_api_key: Option<&str>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    if let Some(key) = weather_api_key {
        registry.register(Box::new(CurrentWeatherTool::new(key)));
    }
    registry
}
