use serde_json::json;
use std::sync::Arc;
use tracing::warn;

use crate::errors::ToolResult;
use crate::models::tool::{bind, ParamType, ToolArgs, ToolDefinition, ToolParameter};
use crate::weather::WeatherService;

pub struct WeatherTools {
    service: Arc<dyn WeatherService>,
}

impl WeatherTools {
    pub fn new(service: Arc<dyn WeatherService>) -> Self {
        Self { service }
    }

    pub fn definitions(self: &Arc<Self>) -> Vec<ToolDefinition> {
        vec![ToolDefinition::new(
            "getCurrentWeather",
            "Get the current weather for a city. Returns the weather service's JSON report.",
            bind(self, |tools, args| async move { tools.get_current_weather(args).await }),
        )
        .with_param(ToolParameter::required(
            "city",
            ParamType::String,
            "City name in English, e.g. Seoul",
        ))]
    }

    /// A blank city and upstream failures are reported as `{"error": ...}`
    pub async fn get_current_weather(&self, args: ToolArgs) -> ToolResult<String> {
        let city = args.str("city")?.trim();
        if city.is_empty() {
            warn!("weather lookup without a city");
            return Ok(json!({ "error": "City is required." }).to_string());
        }

        match self.service.current_weather(city).await {
            Ok(report) => Ok(report),
            Err(err) => {
                warn!(city, error = %err, "weather lookup failed");
                Ok(json!({ "error": err.to_string() }).to_string())
            }
        }
    }
}
