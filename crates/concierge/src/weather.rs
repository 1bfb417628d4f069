use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

pub const OPENWEATHER_HOST: &str = "https://api.openweathermap.org";
pub const OPENWEATHER_PATH: &str = "/data/2.5/weather";

#[derive(Debug, Clone)]
pub struct WeatherConfig {
    pub api_key: String,
    pub base_url: String,
    pub path: String,
    pub timeout: Duration,
}

impl WeatherConfig {
    pub fn new<S: Into<String>>(api_key: S) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: OPENWEATHER_HOST.to_string(),
            path: OPENWEATHER_PATH.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        )
    }
}

/// Source of current weather reports, as raw JSON text
#[async_trait]
pub trait WeatherService: Send + Sync {
    async fn current_weather(&self, city: &str) -> Result<String>;
}

/// OpenWeather-compatible HTTP client
pub struct OpenWeatherClient {
    client: Client,
    config: WeatherConfig,
}

impl OpenWeatherClient {
    pub fn new(config: WeatherConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        debug!(url = %config.url(), api_key_set = !config.api_key.is_empty(), "weather client configured");
        Ok(Self { client, config })
    }
}

#[async_trait]
impl WeatherService for OpenWeatherClient {
    async fn current_weather(&self, city: &str) -> Result<String> {
        let response = self
            .client
            .get(self.config.url())
            .query(&[
                ("q", city),
                ("appid", self.config.api_key.as_str()),
                ("units", "metric"),
                ("lang", "kr"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Weather API returned {}", status));
        }
        Ok(response.text().await?)
    }
}
