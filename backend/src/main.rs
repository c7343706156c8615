#![forbid(unsafe_code)]
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::filter::EnvFilter;
use travel_site::api::{site_router, SiteState};
use travel_site::config::SiteConfig;
use travel_site::PaymentClient;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = dotenvy::dotenv() {
        debug!("No .env file loaded: {}", e);
    }
    let config = SiteConfig::from_env()?;

    info!("Starting server");
    info!("Payment API at {}", config.payment_api_url);
    info!("Serving frontend from {}", config.frontend_dir);

    let client = PaymentClient::new(&config.payment_api_url)
        .with_create_timeout(config.create_timeout);
    let state = Arc::new(SiteState::new(client, &config));
    let app = site_router(state, &config.frontend_dir);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
