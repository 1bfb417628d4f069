use anyhow::Result;
use concierge::{
    chat::{ChatSession, DEFAULT_INSTRUCTIONS},
    invoker::ToolInvoker,
    memory::ConversationMemory,
    providers::base::Provider,
    store::DirectoryStore,
    tools::default_registry,
    weather::WeatherService,
};
use std::sync::Arc;

use crate::configuration::ChatSettings;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<ChatSession>,
    pub invoker: Arc<ToolInvoker>,
    pub memory: Arc<ConversationMemory>,
}

impl AppState {
    /// Wire the tool catalog, the invoker and conversation memory around a provider
    pub fn new(
        provider: Box<dyn Provider>,
        store: Arc<dyn DirectoryStore>,
        weather: Arc<dyn WeatherService>,
        chat: &ChatSettings,
    ) -> Result<Self> {
        let registry = default_registry(store, weather)?;
        let invoker =
            Arc::new(ToolInvoker::new(Arc::new(registry)).with_timeout(chat.tool_timeout()));
        let memory = Arc::new(ConversationMemory::new(chat.memory_config()));
        let session = ChatSession::new(
            provider,
            Arc::clone(&invoker),
            Arc::clone(&memory),
            DEFAULT_INSTRUCTIONS,
        )?
        .with_max_tool_rounds(chat.max_tool_rounds);

        Ok(Self {
            session: Arc::new(session),
            invoker,
            memory,
        })
    }
}

#[cfg(test)]
pub mod test_support {
    use super::*;
    use concierge::providers::{
        configs::{OpenAiProviderConfig, ProviderConfig},
        factory::get_provider,
    };
    use concierge::store::InMemoryStore;
    use concierge::weather::{OpenWeatherClient, WeatherConfig};

    /// State whose provider and weather service both talk to `uri`
    pub fn state_for(uri: &str) -> AppState {
        let mut provider = OpenAiProviderConfig::openai("test-key");
        provider.host = uri.to_string();
        let provider = get_provider(ProviderConfig::OpenAi(provider)).unwrap();

        let mut weather = WeatherConfig::new("weather-key");
        weather.base_url = uri.to_string();
        let weather = OpenWeatherClient::new(weather).unwrap();

        AppState::new(
            provider,
            Arc::new(InMemoryStore::new()),
            Arc::new(weather),
            &ChatSettings::default(),
        )
        .unwrap()
    }
}
