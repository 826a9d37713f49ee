//! Server: loads `.env`, connects the post store, binds the Gemini generator and serves the API.

use carousel_api::{app, AppConfig, AppState, GeminiGeneratorFactory, PostStore};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("carousel_api=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    let store = PostStore::connect(&config.database_url).await?;
    let generators = GeminiGeneratorFactory::new(&config.gemini)?;
    if config.gemini.api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY not set; requests must send X-Gemini-Api-Key");
    }

    let bind_addr = config.bind_addr;
    let state = AppState::new(store, Arc::new(generators), config);
    let router = app(state)?;

    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}
