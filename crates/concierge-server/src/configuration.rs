use crate::error::{missing_field_path, to_env_var, ConfigError, ENV_PREFIX};
use concierge::chat::DEFAULT_MAX_TOOL_ROUNDS;
use concierge::memory::{MemoryConfig, DEFAULT_MAX_MESSAGES};
use concierge::providers::{
    configs::{self, OpenAiProviderConfig, ProviderConfig},
    factory::ProviderType,
};
use concierge::weather::{WeatherConfig, OPENWEATHER_HOST, OPENWEATHER_PATH};
use config::{Config, Environment};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    /// `host:port`, resolved when the listener binds
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type")]
pub enum ProviderSettings {
    OpenAi {
        #[serde(default = "default_openai_host")]
        host: String,
        api_key: String,
        #[serde(default = "default_openai_model")]
        model: String,
        #[serde(default)]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<i32>,
    },
    Ollama {
        #[serde(default = "default_ollama_host")]
        host: String,
        #[serde(default)]
        api_key: Option<String>,
        #[serde(default = "default_ollama_model")]
        model: String,
        #[serde(default)]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<i32>,
    },
}

impl ProviderSettings {
    pub fn provider_type(&self) -> ProviderType {
        match self {
            ProviderSettings::OpenAi { .. } => ProviderType::OpenAi,
            ProviderSettings::Ollama { .. } => ProviderType::Ollama,
        }
    }

    pub fn into_config(self) -> ProviderConfig {
        match self {
            ProviderSettings::OpenAi {
                host,
                api_key,
                model,
                temperature,
                max_tokens,
            } => ProviderConfig::OpenAi(OpenAiProviderConfig {
                host,
                api_key: Some(api_key),
                model,
                temperature,
                max_tokens,
            }),
            ProviderSettings::Ollama {
                host,
                api_key,
                model,
                temperature,
                max_tokens,
            } => ProviderConfig::Ollama(OpenAiProviderConfig {
                host,
                api_key,
                model,
                temperature,
                max_tokens,
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WeatherSettings {
    pub api_key: String,
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    #[serde(default = "default_weather_path")]
    pub path: String,
    #[serde(default = "default_weather_timeout_secs")]
    pub timeout_secs: u64,
}

impl WeatherSettings {
    pub fn into_config(self) -> WeatherConfig {
        WeatherConfig {
            api_key: self.api_key,
            base_url: self.base_url,
            path: self.path,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatSettings {
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
    #[serde(default)]
    pub retain_system: bool,
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            max_messages: default_max_messages(),
            retain_system: false,
            tool_timeout_secs: default_tool_timeout_secs(),
            max_tool_rounds: default_max_tool_rounds(),
        }
    }
}

impl ChatSettings {
    pub fn memory_config(&self) -> MemoryConfig {
        MemoryConfig::new(self.max_messages).with_retain_system(self.retain_system)
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    pub provider: ProviderSettings,
    pub weather: WeatherSettings,
    #[serde(default)]
    pub chat: ChatSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_and_validate()
    }

    fn load_and_validate() -> Result<Self, ConfigError> {
        // Start with default configuration
        let config = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            .set_default("provider.type", ProviderType::OpenAi.to_string())?
            .set_default("weather.base_url", default_weather_base_url())?
            .set_default("weather.path", default_weather_path())?
            .set_default("weather.timeout_secs", default_weather_timeout_secs())?
            // Layer on the environment variables
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        for key in required_keys(&config) {
            if let Err(config::ConfigError::NotFound(_)) = config.get_string(key) {
                return Err(ConfigError::MissingEnvVar {
                    env_var: to_env_var(key),
                });
            }
        }

        let result: Result<Self, config::ConfigError> = config.try_deserialize();

        match result {
            Ok(settings) => Ok(settings),
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);

                if let Some(field) = missing_field_path(&err.to_string()) {
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(&field),
                    })
                } else if let config::ConfigError::NotFound(field) = &err {
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else {
                    Err(ConfigError::Other(err))
                }
            }
        }
    }
}

/// Keys with no default that the selected provider needs
fn required_keys(config: &Config) -> Vec<&'static str> {
    let mut keys = vec!["weather.api_key"];
    let provider_type = config
        .get_string("provider.type")
        .unwrap_or_default()
        .parse::<ProviderType>();
    if matches!(provider_type, Ok(ProviderType::OpenAi)) {
        keys.push("provider.api_key");
    }
    keys
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_openai_host() -> String {
    configs::OPENAI_HOST.to_string()
}

fn default_openai_model() -> String {
    configs::OPENAI_MODEL.to_string()
}

fn default_ollama_host() -> String {
    configs::OLLAMA_HOST.to_string()
}

fn default_ollama_model() -> String {
    configs::OLLAMA_MODEL.to_string()
}

fn default_weather_base_url() -> String {
    OPENWEATHER_HOST.to_string()
}

fn default_weather_path() -> String {
    OPENWEATHER_PATH.to_string()
}

fn default_weather_timeout_secs() -> u64 {
    10
}

fn default_max_messages() -> usize {
    DEFAULT_MAX_MESSAGES
}

fn default_tool_timeout_secs() -> u64 {
    30
}

fn default_max_tool_rounds() -> usize {
    DEFAULT_MAX_TOOL_ROUNDS
}
