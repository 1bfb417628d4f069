mod configuration;
mod error;
mod routes;
mod state;

use concierge::{
    providers::factory,
    store::InMemoryStore,
    weather::OpenWeatherClient,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{configuration::Settings, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let settings = Settings::new()?;
    let address = settings.server.bind_address();
    let provider_type = settings.provider.provider_type();

    let provider = factory::get_provider(settings.provider.into_config())?;
    let weather = OpenWeatherClient::new(settings.weather.into_config())?;

    // Create app state
    let state = AppState::new(
        provider,
        Arc::new(InMemoryStore::new()),
        Arc::new(weather),
        &settings.chat,
    )?;
    info!(
        provider = %provider_type,
        tools = state.invoker.registry().len(),
        max_messages = settings.chat.max_messages,
        "concierge ready"
    );

    let app = routes::configure(state);

    // Run server
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
